//! # orderflow-core: Pure Business Logic for Order Placement
//!
//! This crate holds the rules of the order workflow as pure functions and
//! plain types. It performs no I/O; storage is reached only through the
//! contracts in [`store`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orderflow Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Transport layer (HTTP, not in this repo)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                orderflow-service (OrderService)                 │   │
//! │  │    place_order, transition_order_status, list, lookup           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ orderflow-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │validation│ │ pricing │ │ store  │  │   │
//! │  │   │ Product │ │  Money  │ │ Request  │ │  Quote  │ │ traits │  │   │
//! │  │   │  Order  │ │         │ │  Limits  │ │         │ │        │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 orderflow-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, transactional ledger         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, OrderItem, identifiers)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`status`] - Order status enumeration and transition policy
//! - [`validation`] - Typed request construction and catalog field rules
//! - [`pricing`] - Stock checks, price snapshots and exact totals
//! - [`store`] - Contracts the workflow consumes from storage
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use orderflow_core::validation::{OrderLimits, PlaceOrderRequest};
//! use orderflow_core::ProductId;
//!
//! let request = PlaceOrderRequest::parse(&[(ProductId(1), 3)], &OrderLimits::default())
//!     .expect("one positive line is a valid request");
//! assert_eq!(request.lines().len(), 1);
//!
//! // Empty orders never make it past construction
//! assert!(PlaceOrderRequest::parse(&[], &OrderLimits::default()).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod status;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ErrorKind, OrderError, OrderResult, StoreError, StoreResult, ValidationError};
pub use money::Money;
pub use status::{OrderStatus, TransitionPolicy};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;
