//! # Order Repository
//!
//! Database operations for orders and their items.
//!
//! ## Order Lifecycle in the Database
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create(NewOrder)                                                       │
//! │    BEGIN                                                                │
//! │      INSERT orders        (status = 'pending')   ──► id                 │
//! │      INSERT order_items   × n                                           │
//! │    COMMIT                                                               │
//! │                                                                         │
//! │  update_status(id, change)                                              │
//! │    BEGIN                                                                │
//! │      UPDATE orders SET status, updated_at                               │
//! │        WHERE id = ? [AND status = expected]                             │
//! │      no row? SELECT status → NotFound / Conflict                        │
//! │      SELECT order + items                                               │
//! │    COMMIT                                                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items are never modified after creation and are removed only together
//! with their order (`ON DELETE CASCADE`).

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use orderflow_core::store::{StatusChange, StatusUpdate};
use orderflow_core::{
    Money, NewOrder, Order, OrderId, OrderItem, OrderStatus, ProductId, TransactionId,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    transaction_id: String,
    total_cents: i64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> DbResult<Order> {
        let transaction_id = Uuid::parse_str(&self.transaction_id)
            .map(TransactionId::from)
            .map_err(|e| DbError::corrupt("transaction_id", e))?;

        Ok(Order {
            id: self.id,
            transaction_id,
            items,
            total: Money::from_cents(self.total_cents),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    unit_price_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: Money::from_cents(row.unit_price_cents),
            created_at: row.created_at,
        }
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, transaction_id, total_cents, status, created_at, updated_at
    FROM orders
"#;

const SELECT_ITEM: &str = r#"
    SELECT id, order_id, product_id, quantity, unit_price_cents, created_at
    FROM order_items
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists an order and all of its items in one transaction.
    ///
    /// Stock is not touched here; the ledger transaction combines this
    /// with the stock decrements.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The stored order, status `pending`
    /// * `Err(DbError::UniqueViolation)` - Transaction id already used
    pub async fn create(&self, order: &NewOrder) -> DbResult<Order> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let created = insert_order(&mut tx, order).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(created)
    }

    /// Gets an order with its items by store id.
    pub async fn get_by_id(&self, id: OrderId) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// Gets an order with its items by its transaction id.
    pub async fn get_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;

        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{SELECT_ORDER} WHERE transaction_id = ?1"))
                .bind(transaction_id.to_string())
                .fetch_optional(&mut *conn)
                .await?;

        match row {
            Some(row) => {
                let items = fetch_items(&mut conn, row.id).await?;
                row.into_order(items).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Lists every order with its items, oldest first.
    ///
    /// Two queries regardless of the number of orders: one for orders,
    /// one for all items, joined in memory.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} ORDER BY id"))
            .fetch_all(&mut *tx)
            .await?;

        let item_rows: Vec<OrderItemRow> =
            sqlx::query_as(&format!("{SELECT_ITEM} ORDER BY order_id, id"))
                .fetch_all(&mut *tx)
                .await?;

        tx.commit().await?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in item_rows {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(item.into());
        }

        let orders = rows
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// Sets the status of an order and refreshes its modification time.
    ///
    /// With `change.expected_from` set, the update only applies while the
    /// order still has that status; otherwise the current status is
    /// reported as a conflict and nothing changes.
    pub async fn update_status(&self, id: OrderId, change: StatusChange) -> DbResult<StatusUpdate> {
        debug!(id = %id, to = %change.to, expected = ?change.expected_from, "Updating order status");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?2,
                updated_at = ?3
            WHERE id = ?1 AND (?4 IS NULL OR status = ?4)
            "#,
        )
        .bind(id)
        .bind(change.to)
        .bind(now)
        .bind(change.expected_from)
        .execute(&mut *tx)
        .await?;

        let outcome = if result.rows_affected() == 0 {
            let current: Option<OrderStatus> =
                sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;

            match current {
                Some(current) => StatusUpdate::Conflict { current },
                None => StatusUpdate::NotFound,
            }
        } else {
            match fetch_order(&mut tx, id).await? {
                Some(order) => StatusUpdate::Applied(order),
                None => StatusUpdate::NotFound,
            }
        };

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(outcome)
    }
}

// =============================================================================
// Connection-level helpers (shared with the ledger transaction)
// =============================================================================

/// Inserts the order row and its items on `conn`.
///
/// The caller owns the surrounding transaction.
pub(crate) async fn insert_order(conn: &mut SqliteConnection, order: &NewOrder) -> DbResult<Order> {
    debug!(
        transaction_id = %order.transaction_id,
        items = order.items.len(),
        total = %order.total,
        "Inserting order"
    );

    let row: OrderRow = sqlx::query_as(
        r#"
        INSERT INTO orders (transaction_id, total_cents, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)
        RETURNING id, transaction_id, total_cents, status, created_at, updated_at
        "#,
    )
    .bind(order.transaction_id.to_string())
    .bind(order.total.cents())
    .bind(NewOrder::STATUS)
    .bind(order.placed_at)
    .fetch_one(&mut *conn)
    .await?;

    let mut items = Vec::with_capacity(order.items.len());
    for item in &order.items {
        let item_row: OrderItemRow = sqlx::query_as(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, order_id, product_id, quantity, unit_price_cents, created_at
            "#,
        )
        .bind(row.id)
        .bind(item.product_id)
        .bind(item.quantity.get())
        .bind(item.unit_price.cents())
        .bind(order.placed_at)
        .fetch_one(&mut *conn)
        .await?;

        items.push(item_row.into());
    }

    row.into_order(items)
}

pub(crate) async fn fetch_order(conn: &mut SqliteConnection, id: OrderId) -> DbResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let items = fetch_items(conn, row.id).await?;
            row.into_order(items).map(Some)
        }
        None => Ok(None),
    }
}

async fn fetch_items(conn: &mut SqliteConnection, order_id: OrderId) -> DbResult<Vec<OrderItem>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(&format!("{SELECT_ITEM} WHERE order_id = ?1 ORDER BY id"))
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(OrderItem::from).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
