//! # Order Service
//!
//! The workflow callers use: place an order, change its status, read orders.
//!
//! ## Placement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  place_order(request)                                                   │
//! │                                                                         │
//! │  1. request is a PlaceOrderRequest   (non-empty, quantities ≥ 1)        │
//! │                                                                         │
//! │  2-4. READ PHASE (no locks, no writes)                                  │
//! │     for each line, in submission order:                                 │
//! │       get_product ──── missing? ──────────► ProductNotFound(id)         │
//! │       stock check ──── short?   ──────────► InsufficientStock(name)     │
//! │       price snapshot, checked total                                     │
//! │                                                                         │
//! │  5. fresh TransactionId                                                 │
//! │                                                                         │
//! │  6. ATOMIC PHASE (under commit_timeout)                                 │
//! │     begin                                                               │
//! │       decrement_stock × n ── refused? ──► rollback, InsufficientStock   │
//! │       create_order                                                      │
//! │     commit                   ── failed? ──► PersistenceFailure          │
//! │                                                                         │
//! │  7. persisted Order                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The read phase can be overtaken by a concurrent order. The atomic phase
//! re-checks every line through the store's conditional decrement, so the
//! earlier read is only used to fail fast and to price the order.

use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use orderflow_core::pricing::OrderQuote;
use orderflow_core::store::{
    InventoryStore, LedgerTransaction, OrderLedger, OrderStore, StatusChange, StatusUpdate,
    StockDecrement,
};
use orderflow_core::validation::{OrderLimits, PlaceOrderRequest};
use orderflow_core::{
    NewOrder, Order, OrderError, OrderId, OrderResult, OrderStatus, Product, ProductId,
    StoreError, TransactionId, TransitionPolicy,
};

use crate::config::ServiceConfig;

/// Attempts at a conditional status change before giving up on a
/// concurrently changing order.
const MAX_STATUS_ATTEMPTS: usize = 3;

/// Order placement and lifecycle over any [`OrderLedger`].
#[derive(Debug, Clone)]
pub struct OrderService<L> {
    ledger: L,
    limits: OrderLimits,
    policy: TransitionPolicy,
    commit_timeout: Duration,
}

impl<L: OrderLedger> OrderService<L> {
    /// Creates a service with default limits, the permissive status policy
    /// and a 5 second commit deadline.
    pub fn new(ledger: L) -> Self {
        Self::from_config(ledger, &ServiceConfig::default())
    }

    /// Creates a service with the limits, policy and deadline of `config`.
    pub fn from_config(ledger: L, config: &ServiceConfig) -> Self {
        OrderService {
            ledger,
            limits: config.limits,
            policy: config.status_policy,
            commit_timeout: config.commit_timeout,
        }
    }

    /// Sets the request limits.
    pub fn with_limits(mut self, limits: OrderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the status transition policy.
    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the deadline for the transactional part of a placement.
    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn limits(&self) -> &OrderLimits {
        &self.limits
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Places an order for `request`.
    ///
    /// ## Returns
    /// * `Ok(Order)` - Persisted order, status `pending`, stock deducted
    /// * `Err(ProductNotFound)` - A line references a missing product
    /// * `Err(InsufficientStock)` - First line (in submission order) that
    ///   cannot be covered, whether found in the read phase or at commit
    /// * `Err(PersistenceFailure)` - Store failure or deadline; safe to retry
    ///
    /// On every error, no order exists and no stock has changed.
    pub async fn place_order(&self, request: &PlaceOrderRequest) -> OrderResult<Order> {
        debug!(lines = request.lines().len(), "place_order");

        let new_order = self.price(request).await?;
        let order = self.persist(&new_order).await?;

        info!(
            order_id = %order.id,
            transaction_id = %order.transaction_id,
            total = %order.total,
            items = order.items.len(),
            "Order placed"
        );

        Ok(order)
    }

    /// Parses raw `(product_id, quantity)` pairs with this service's limits
    /// and places the order.
    pub async fn place_order_lines(&self, lines: &[(i64, i64)]) -> OrderResult<Order> {
        let raw: Vec<(ProductId, i64)> = lines
            .iter()
            .map(|&(product_id, quantity)| (ProductId(product_id), quantity))
            .collect();

        let request = PlaceOrderRequest::parse(&raw, &self.limits).map_err(|err| {
            warn!(error = %err, "Order request rejected");
            OrderError::InvalidRequest(err)
        })?;

        self.place_order(&request).await
    }

    /// Read phase: lookups and stock checks, interleaved per line.
    async fn price(&self, request: &PlaceOrderRequest) -> OrderResult<NewOrder> {
        let mut products: HashMap<ProductId, Product> = HashMap::new();
        let mut quote = OrderQuote::new();

        for line in request.lines() {
            let product = match products.entry(line.product_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let Some(product) = self.ledger.get_product(line.product_id).await? else {
                        warn!(product_id = %line.product_id, "Order references a missing product");
                        return Err(OrderError::ProductNotFound(line.product_id));
                    };
                    entry.insert(product)
                }
            };

            quote.add_line(product, line.quantity).inspect_err(|err| {
                warn!(
                    product_id = %line.product_id,
                    quantity = %line.quantity,
                    stock = product.stock,
                    error = %err,
                    "Order line rejected"
                );
            })?;
        }

        Ok(quote.into_new_order(TransactionId::generate(), Utc::now()))
    }

    /// Atomic phase: decrement every line, insert the order, commit.
    async fn persist(&self, order: &NewOrder) -> OrderResult<Order> {
        let deadline = Instant::now() + self.commit_timeout;

        let mut tx = timeout_at(deadline, self.ledger.begin())
            .await
            .map_err(|_| self.deadline_elapsed(order))??;

        match timeout_at(deadline, stage(&mut tx, order)).await {
            Ok(Ok(persisted)) => {
                tx.commit().await.inspect_err(|err| {
                    warn!(transaction_id = %order.transaction_id, error = %err, "Commit failed");
                })?;
                Ok(persisted)
            }
            Ok(Err(err)) => {
                abort(tx, &err).await;
                Err(err)
            }
            Err(_) => {
                // Dropping the transaction rolls it back.
                drop(tx);
                Err(self.deadline_elapsed(order))
            }
        }
    }

    fn deadline_elapsed(&self, order: &NewOrder) -> OrderError {
        let millis = u64::try_from(self.commit_timeout.as_millis()).unwrap_or(u64::MAX);
        warn!(
            transaction_id = %order.transaction_id,
            timeout_ms = millis,
            "Placement deadline elapsed; rolled back"
        );
        OrderError::PersistenceFailure(StoreError::Timeout(millis))
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Sets the status of order `id` to `requested`.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The order with the new status and a refreshed
    ///   modification time
    /// * `Err(InvalidRequest)` - `requested` is not one of the five statuses
    /// * `Err(OrderNotFound)` - No order with this id
    /// * `Err(TransitionRejected)` - The configured policy forbids the change
    pub async fn transition_order_status(&self, id: OrderId, requested: &str) -> OrderResult<Order> {
        debug!(order_id = %id, requested = %requested, "transition_order_status");

        let to: OrderStatus = requested.parse().map_err(|err| {
            warn!(order_id = %id, requested = %requested, "Unknown order status");
            OrderError::InvalidRequest(err)
        })?;

        let mut change = match self.policy {
            TransitionPolicy::Permissive => StatusChange::to(to),
            TransitionPolicy::ForwardOnly => {
                let current = self
                    .ledger
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| OrderError::OrderNotFound(id.to_string()))?
                    .status;
                self.check_transition(id, current, to)?;
                StatusChange::from_to(current, to)
            }
        };

        for _ in 0..MAX_STATUS_ATTEMPTS {
            match self.ledger.update_status(id, change).await? {
                StatusUpdate::Applied(order) => {
                    info!(order_id = %id, status = %order.status, "Order status changed");
                    return Ok(order);
                }
                StatusUpdate::NotFound => {
                    return Err(OrderError::OrderNotFound(id.to_string()));
                }
                StatusUpdate::Conflict { current } => {
                    debug!(order_id = %id, current = %current, "Status changed concurrently");
                    self.check_transition(id, current, to)?;
                    change = StatusChange::from_to(current, to);
                }
            }
        }

        Err(StoreError::Unavailable(format!("order {id} kept changing status concurrently")).into())
    }

    fn check_transition(&self, id: OrderId, from: OrderStatus, to: OrderStatus) -> OrderResult<()> {
        if self.policy.allows(from, to) {
            return Ok(());
        }

        warn!(order_id = %id, from = %from, to = %to, "Status transition rejected");
        Err(OrderError::TransitionRejected { from, to })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All orders with their items, oldest first.
    pub async fn list_orders(&self) -> OrderResult<Vec<Order>> {
        Ok(self.ledger.get_all().await?)
    }

    pub async fn get_order(&self, id: OrderId) -> OrderResult<Order> {
        self.ledger
            .get_by_id(id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(id.to_string()))
    }

    pub async fn get_order_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> OrderResult<Order> {
        self.ledger
            .get_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(transaction_id.to_string()))
    }

    /// Looks an order up by the raw token a client sent.
    ///
    /// A token that is not a valid transaction id cannot match any order and
    /// is reported as `OrderNotFound`.
    pub async fn get_order_by_transaction_token(&self, token: &str) -> OrderResult<Order> {
        match TransactionId::parse(token) {
            Ok(transaction_id) => self.get_order_by_transaction_id(&transaction_id).await,
            Err(_) => Err(OrderError::OrderNotFound(token.to_string())),
        }
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

async fn stage<T: LedgerTransaction>(tx: &mut T, order: &NewOrder) -> OrderResult<Order> {
    for item in &order.items {
        match tx.decrement_stock(item.product_id, item.quantity).await? {
            StockDecrement::Applied { .. } => {}
            StockDecrement::Insufficient { available } => {
                warn!(
                    product_id = %item.product_id,
                    requested = %item.quantity,
                    available,
                    "Stock taken by a concurrent order"
                );
                return Err(OrderError::InsufficientStock(item.product_name.clone()));
            }
            StockDecrement::ProductMissing => {
                warn!(product_id = %item.product_id, "Product removed during placement");
                return Err(OrderError::ProductNotFound(item.product_id));
            }
        }
    }

    Ok(tx.create_order(order).await?)
}

async fn abort<T: LedgerTransaction>(tx: T, cause: &OrderError) {
    match tx.rollback().await {
        Ok(()) => debug!(cause = %cause, "Placement rolled back"),
        Err(err) => warn!(cause = %cause, error = %err, "Rollback failed; transaction dropped"),
    }
}
