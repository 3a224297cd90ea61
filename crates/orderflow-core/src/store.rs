//! # Store Contracts
//!
//! The capabilities the order workflow consumes from storage.
//!
//! ## Contract Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  InventoryStore                    OrderStore                           │
//! │  ├── get_product(id)               ├── create(order)                    │
//! │  └── decrement_stock(id, n)        ├── get_by_id(id)                    │
//! │       (atomic compare-and-          ├── get_by_transaction_id(token)    │
//! │        decrement)                  ├── get_all()                        │
//! │                                    └── update_status(id, change)        │
//! │              ▲                            ▲                             │
//! │              └──────────┬─────────────────┘                             │
//! │                         │                                               │
//! │                    OrderLedger                                          │
//! │                    └── begin() ──► LedgerTransaction                    │
//! │                                    ├── decrement_stock(id, n)           │
//! │                                    ├── create_order(order)              │
//! │                                    ├── commit()                         │
//! │                                    └── rollback()   (also on drop)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `decrement_stock` must never be a read followed by a write issued by the
//! caller. Implementations perform the check and the decrement as one step,
//! so two concurrent decrements can never both succeed when their sum
//! exceeds the available stock.
//!
//! Everything done through a [`LedgerTransaction`] becomes visible at
//! `commit` or not at all. Dropping a transaction without committing it
//! discards its effects.

use std::future::Future;

use crate::error::StoreResult;
use crate::status::OrderStatus;
use crate::types::{NewOrder, Order, OrderId, Product, ProductId, Quantity, TransactionId};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock covered the amount and was reduced.
    Applied { remaining: i64 },
    /// Stock was lower than the amount; nothing changed.
    Insufficient { available: i64 },
    /// No product with this id.
    ProductMissing,
}

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub to: OrderStatus,
    /// When set, the change only applies if the order is still in this status.
    pub expected_from: Option<OrderStatus>,
}

impl StatusChange {
    /// Unconditional change.
    pub fn to(status: OrderStatus) -> Self {
        StatusChange {
            to: status,
            expected_from: None,
        }
    }

    /// Change that only applies from `from`.
    pub fn from_to(from: OrderStatus, to: OrderStatus) -> Self {
        StatusChange {
            to,
            expected_from: Some(from),
        }
    }
}

/// Result of a status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The order after the update, with a refreshed modification time.
    Applied(Order),
    NotFound,
    /// `expected_from` did not match; nothing changed.
    Conflict { current: OrderStatus },
}

// =============================================================================
// Inventory Store
// =============================================================================

/// Read access to products plus the atomic stock decrement.
pub trait InventoryStore: Send + Sync {
    fn get_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = StoreResult<Option<Product>>> + Send;

    /// Decrements stock by `amount` if and only if stock covers it.
    fn decrement_stock(
        &self,
        id: ProductId,
        amount: Quantity,
    ) -> impl Future<Output = StoreResult<StockDecrement>> + Send;
}

// =============================================================================
// Order Store
// =============================================================================

/// Persistence of orders and their items.
pub trait OrderStore: Send + Sync {
    /// Persists the order (status `pending`) and all items as one unit.
    fn create(&self, order: &NewOrder) -> impl Future<Output = StoreResult<Order>> + Send;

    fn get_by_id(&self, id: OrderId) -> impl Future<Output = StoreResult<Option<Order>>> + Send;

    fn get_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> impl Future<Output = StoreResult<Option<Order>>> + Send;

    /// All orders with their items, oldest first.
    fn get_all(&self) -> impl Future<Output = StoreResult<Vec<Order>>> + Send;

    fn update_status(
        &self,
        id: OrderId,
        change: StatusChange,
    ) -> impl Future<Output = StoreResult<StatusUpdate>> + Send;
}

// =============================================================================
// Ledger (transactional scope spanning both stores)
// =============================================================================

/// An open all-or-nothing unit of work over inventory and orders.
pub trait LedgerTransaction: Send {
    fn decrement_stock(
        &mut self,
        id: ProductId,
        amount: Quantity,
    ) -> impl Future<Output = StoreResult<StockDecrement>> + Send;

    fn create_order(&mut self, order: &NewOrder)
        -> impl Future<Output = StoreResult<Order>> + Send;

    /// Makes every effect of this transaction visible.
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Discards every effect of this transaction.
    fn rollback(self) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Both stores plus the ability to open a transaction spanning them.
pub trait OrderLedger: InventoryStore + OrderStore {
    type Transaction: LedgerTransaction;

    fn begin(&self) -> impl Future<Output = StoreResult<Self::Transaction>> + Send;
}
