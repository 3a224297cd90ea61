//! # SQLite Ledger
//!
//! [`Database`] as an implementation of the store contracts, and the
//! transaction type that makes order placement atomic.
//!
//! ## One Placement, One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  begin()                                  BEGIN                         │
//! │  decrement_stock(p1, 2)                   UPDATE products … RETURNING   │
//! │  decrement_stock(p2, 1)                   UPDATE products … RETURNING   │
//! │  create_order(order)                      INSERT orders / order_items   │
//! │  commit()                                 COMMIT                        │
//! │                                                                         │
//! │  Any failure or a dropped transaction     ROLLBACK                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first statement of a placement is a write. SQLite then takes the
//! write lock immediately instead of upgrading a read snapshot later, which
//! under WAL could fail with `SQLITE_BUSY_SNAPSHOT` no matter how long the
//! busy timeout is.

use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{order, product};
use orderflow_core::store::{
    InventoryStore, LedgerTransaction, OrderLedger, OrderStore, StatusChange, StatusUpdate,
    StockDecrement,
};
use orderflow_core::{
    NewOrder, Order, OrderId, Product, ProductId, Quantity, StoreResult, TransactionId,
};

// =============================================================================
// Transaction
// =============================================================================

/// An open SQLite transaction spanning stock and orders.
///
/// Dropping it without calling [`LedgerTransaction::commit`] rolls back.
pub struct SqliteLedgerTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl LedgerTransaction for SqliteLedgerTransaction {
    async fn decrement_stock(
        &mut self,
        id: ProductId,
        amount: Quantity,
    ) -> StoreResult<StockDecrement> {
        Ok(product::decrement_stock(&mut self.tx, id, amount).await?)
    }

    async fn create_order(&mut self, new_order: &NewOrder) -> StoreResult<Order> {
        Ok(order::insert_order(&mut self.tx, new_order).await?)
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(DbError::from)?;
        debug!("Ledger transaction committed");
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await.map_err(DbError::from)?;
        debug!("Ledger transaction rolled back");
        Ok(())
    }
}

// =============================================================================
// Store Contracts
// =============================================================================

impl InventoryStore for Database {
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.products().get_by_id(id).await?)
    }

    async fn decrement_stock(&self, id: ProductId, amount: Quantity) -> StoreResult<StockDecrement> {
        Ok(self.products().decrement_stock(id, amount).await?)
    }
}

impl OrderStore for Database {
    async fn create(&self, order: &NewOrder) -> StoreResult<Order> {
        Ok(self.orders().create(order).await?)
    }

    async fn get_by_id(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.orders().get_by_id(id).await?)
    }

    async fn get_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> StoreResult<Option<Order>> {
        Ok(self.orders().get_by_transaction_id(transaction_id).await?)
    }

    async fn get_all(&self) -> StoreResult<Vec<Order>> {
        Ok(self.orders().list_all().await?)
    }

    async fn update_status(&self, id: OrderId, change: StatusChange) -> StoreResult<StatusUpdate> {
        Ok(self.orders().update_status(id, change).await?)
    }
}

impl OrderLedger for Database {
    type Transaction = SqliteLedgerTransaction;

    async fn begin(&self) -> StoreResult<SqliteLedgerTransaction> {
        let tx = self.pool().begin().await.map_err(DbError::from)?;
        Ok(SqliteLedgerTransaction { tx })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
