//! # Repository Module
//!
//! SQL access for the catalog and for orders.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OrderService / seed binary                                             │
//! │       │                                                                 │
//! │       │  db.products().decrement_stock(id, qty)                         │
//! │       ▼                                                                 │
//! │  ProductRepository               OrderRepository                        │
//! │  ├── get_by_id / list_all        ├── create                             │
//! │  ├── insert / delete             ├── get_by_id / get_by_transaction_id  │
//! │  └── decrement_stock             ├── list_all                           │
//! │                                  └── update_status                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository also exposes connection-level helpers to the crate so
//! [`crate::ledger`] can run the same statements inside one transaction.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog and stock
//! - [`order::OrderRepository`] - Orders and order items

pub mod order;
pub mod product;
