//! # In-Memory Ledger
//!
//! A process-local implementation of the store contracts.
//!
//! ## Locking Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Arc<Mutex<LedgerState>>                                                │
//! │       │                                                                 │
//! │       ├── get_product / get_all / ...   lock, read, unlock              │
//! │       │                                                                 │
//! │       └── begin() ──► OwnedMutexGuard held by the transaction           │
//! │              │                                                          │
//! │              ├── decrement_stock   ──► push Undo::Stock                 │
//! │              ├── create_order      ──► push Undo::Order                 │
//! │              │                                                          │
//! │              ├── commit   ──► forget undo log, release lock             │
//! │              └── rollback ──► replay undo log backwards, release lock   │
//! │                  (also on drop)                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transaction serializes all other access to the ledger until it ends.
//! Changes are applied in place, so nobody else can observe them before the
//! transaction releases the lock.
//!
//! ## Failure Injection
//! [`InMemoryLedger::fail_next_commit`] and
//! [`InMemoryLedger::fail_next_create`] make the next matching call fail with
//! a [`StoreError`], which exercises the rollback paths of the workflow.

use chrono::{DateTime, Duration as TimeDelta, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use orderflow_core::store::{
    InventoryStore, LedgerTransaction, OrderLedger, OrderStore, StatusChange, StatusUpdate,
    StockDecrement,
};
use orderflow_core::validation::validate_new_product;
use orderflow_core::{
    NewOrder, NewProduct, Order, OrderId, OrderItem, OrderResult, Product, ProductId, Quantity,
    StoreError, StoreResult, TransactionId,
};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Default)]
struct LedgerState {
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    next_product_id: i64,
    next_order_id: i64,
    next_item_id: i64,
}

impl LedgerState {
    fn decrement(&mut self, id: ProductId, amount: Quantity) -> (StockDecrement, Option<Undo>) {
        let Some(product) = self.products.get_mut(&id) else {
            return (StockDecrement::ProductMissing, None);
        };

        if product.stock < amount.get() {
            return (
                StockDecrement::Insufficient {
                    available: product.stock,
                },
                None,
            );
        }

        let undo = Undo::Stock {
            id,
            stock: product.stock,
            updated_at: product.updated_at,
        };
        product.stock -= amount.get();
        product.updated_at = later_than(product.updated_at);

        (
            StockDecrement::Applied {
                remaining: product.stock,
            },
            Some(undo),
        )
    }

    fn insert_order(&mut self, new_order: &NewOrder) -> StoreResult<Order> {
        let duplicate = self
            .orders
            .values()
            .any(|order| order.transaction_id == new_order.transaction_id);
        if duplicate {
            return Err(StoreError::Constraint(format!(
                "duplicate transaction id {}",
                new_order.transaction_id
            )));
        }

        self.next_order_id += 1;
        let order_id = OrderId(self.next_order_id);

        let items = new_order
            .items
            .iter()
            .map(|item| {
                self.next_item_id += 1;
                OrderItem {
                    id: self.next_item_id,
                    order_id,
                    product_id: item.product_id,
                    quantity: item.quantity.get(),
                    unit_price: item.unit_price,
                    created_at: new_order.placed_at,
                }
            })
            .collect();

        let order = Order {
            id: order_id,
            transaction_id: new_order.transaction_id,
            items,
            total: new_order.total,
            status: NewOrder::STATUS,
            created_at: new_order.placed_at,
            updated_at: new_order.placed_at,
        };

        self.orders.insert(order_id, order.clone());
        Ok(order)
    }

    fn apply(&mut self, undo: Undo) {
        match undo {
            Undo::Stock {
                id,
                stock,
                updated_at,
            } => {
                if let Some(product) = self.products.get_mut(&id) {
                    product.stock = stock;
                    product.updated_at = updated_at;
                }
            }
            Undo::Order { id } => {
                self.orders.remove(&id);
            }
        }
    }
}

/// One reversible change made inside a transaction.
#[derive(Debug)]
enum Undo {
    Stock {
        id: ProductId,
        stock: i64,
        updated_at: DateTime<Utc>,
    },
    Order {
        id: OrderId,
    },
}

/// Now, or one nanosecond after `previous` if the clock has not moved on.
fn later_than(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous + TimeDelta::nanoseconds(1))
}

#[derive(Debug, Default)]
struct Faults {
    commit: AtomicBool,
    create: AtomicBool,
}

// =============================================================================
// Ledger
// =============================================================================

/// Process-local ledger. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    faults: Arc<Faults>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product to the catalog.
    pub async fn add_product(&self, product: NewProduct) -> OrderResult<Product> {
        validate_new_product(&product)?;

        let mut state = self.state.lock().await;
        state.next_product_id += 1;

        let now = Utc::now();
        let product = Product {
            id: ProductId(state.next_product_id),
            name: product.name.trim().to_string(),
            price: product.price,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };

        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    /// Removes a product. Existing order items keep their `product_id`.
    pub async fn remove_product(&self, id: ProductId) -> bool {
        self.state.lock().await.products.remove(&id).is_some()
    }

    /// The catalog ordered by id.
    pub async fn products(&self) -> Vec<Product> {
        self.state.lock().await.products.values().cloned().collect()
    }

    /// Makes the next `commit` fail with `StoreError::Unavailable` after
    /// rolling back.
    pub fn fail_next_commit(&self) {
        self.faults.commit.store(true, Ordering::SeqCst);
    }

    /// Makes the next `create_order` inside a transaction fail with
    /// `StoreError::Backend`.
    pub fn fail_next_create(&self) {
        self.faults.create.store(true, Ordering::SeqCst);
    }
}

impl InventoryStore for InMemoryLedger {
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn decrement_stock(&self, id: ProductId, amount: Quantity) -> StoreResult<StockDecrement> {
        let (outcome, _) = self.state.lock().await.decrement(id, amount);
        Ok(outcome)
    }
}

impl OrderStore for InMemoryLedger {
    async fn create(&self, order: &NewOrder) -> StoreResult<Order> {
        self.state.lock().await.insert_order(order)
    }

    async fn get_by_id(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn get_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> StoreResult<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .find(|order| &order.transaction_id == transaction_id)
            .cloned())
    }

    async fn get_all(&self) -> StoreResult<Vec<Order>> {
        Ok(self.state.lock().await.orders.values().cloned().collect())
    }

    async fn update_status(&self, id: OrderId, change: StatusChange) -> StoreResult<StatusUpdate> {
        let mut state = self.state.lock().await;

        let Some(order) = state.orders.get_mut(&id) else {
            return Ok(StatusUpdate::NotFound);
        };

        if let Some(expected) = change.expected_from {
            if order.status != expected {
                return Ok(StatusUpdate::Conflict {
                    current: order.status,
                });
            }
        }

        order.status = change.to;
        order.updated_at = later_than(order.updated_at);
        Ok(StatusUpdate::Applied(order.clone()))
    }
}

impl OrderLedger for InMemoryLedger {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> StoreResult<InMemoryTransaction> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(InMemoryTransaction {
            guard: Some(guard),
            undo: Vec::new(),
            faults: Arc::clone(&self.faults),
        })
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Exclusive, reversible access to an [`InMemoryLedger`].
#[derive(Debug)]
pub struct InMemoryTransaction {
    guard: Option<OwnedMutexGuard<LedgerState>>,
    undo: Vec<Undo>,
    faults: Arc<Faults>,
}

impl InMemoryTransaction {
    fn state(&mut self) -> StoreResult<&mut LedgerState> {
        self.guard
            .as_deref_mut()
            .ok_or_else(|| StoreError::Backend("transaction already finished".to_string()))
    }

    fn revert(&mut self) {
        let undo = std::mem::take(&mut self.undo);
        if let Some(state) = self.guard.as_deref_mut() {
            let steps = undo.len();
            for step in undo.into_iter().rev() {
                state.apply(step);
            }
            debug!(steps, "In-memory transaction rolled back");
        }
        self.guard = None;
    }
}

impl LedgerTransaction for InMemoryTransaction {
    async fn decrement_stock(
        &mut self,
        id: ProductId,
        amount: Quantity,
    ) -> StoreResult<StockDecrement> {
        let (outcome, undo) = self.state()?.decrement(id, amount);
        self.undo.extend(undo);
        Ok(outcome)
    }

    async fn create_order(&mut self, new_order: &NewOrder) -> StoreResult<Order> {
        if self.faults.create.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected create failure".to_string()));
        }

        let order = self.state()?.insert_order(new_order)?;
        self.undo.push(Undo::Order { id: order.id });
        Ok(order)
    }

    async fn commit(mut self) -> StoreResult<()> {
        if self.faults.commit.swap(false, Ordering::SeqCst) {
            self.revert();
            return Err(StoreError::Unavailable("injected commit failure".to_string()));
        }

        self.undo.clear();
        self.guard = None;
        Ok(())
    }

    async fn rollback(mut self) -> StoreResult<()> {
        self.revert();
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if self.guard.is_some() {
            self.revert();
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
