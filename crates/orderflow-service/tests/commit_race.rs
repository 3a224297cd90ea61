//! Stock that disappears between pricing and the transaction.

mod common;

use common::SqliteFixture;
use orderflow_core::store::{
    InventoryStore, OrderLedger, OrderStore, StatusChange, StatusUpdate, StockDecrement,
};
use orderflow_core::validation::{validate_quantity, OrderLimits};
use orderflow_core::{
    NewOrder, Order, OrderError, OrderId, Product, ProductId, Quantity, StoreError, StoreResult,
    TransactionId,
};
use orderflow_db::{Database, SqliteLedgerTransaction};
use orderflow_service::OrderService;

/// SQLite ledger that sells out one product to a competing buyer right
/// after the quote is built and before the placement transaction opens.
struct SellOutLedger {
    db: Database,
    sold_out: ProductId,
}

impl InventoryStore for SellOutLedger {
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        self.db.get_product(id).await
    }

    async fn decrement_stock(&self, id: ProductId, amount: Quantity) -> StoreResult<StockDecrement> {
        self.db.decrement_stock(id, amount).await
    }
}

impl OrderStore for SellOutLedger {
    async fn create(&self, order: &NewOrder) -> StoreResult<Order> {
        self.db.create(order).await
    }

    async fn get_by_id(&self, id: OrderId) -> StoreResult<Option<Order>> {
        self.db.get_by_id(id).await
    }

    async fn get_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> StoreResult<Option<Order>> {
        self.db.get_by_transaction_id(transaction_id).await
    }

    async fn get_all(&self) -> StoreResult<Vec<Order>> {
        self.db.get_all().await
    }

    async fn update_status(&self, id: OrderId, change: StatusChange) -> StoreResult<StatusUpdate> {
        self.db.update_status(id, change).await
    }
}

impl OrderLedger for SellOutLedger {
    type Transaction = SqliteLedgerTransaction;

    async fn begin(&self) -> StoreResult<SqliteLedgerTransaction> {
        let remaining = self
            .db
            .get_product(self.sold_out)
            .await?
            .map_or(0, |product| product.stock);
        if remaining > 0 {
            let all = validate_quantity(remaining, &OrderLimits::default())
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            self.db.decrement_stock(self.sold_out, all).await?;
        }
        self.db.begin().await
    }
}

#[tokio::test]
async fn stock_sold_between_quote_and_commit_rolls_back_every_line() {
    let fx = SqliteFixture::new().await;
    let a = fx.product("A", 1099, 10).await;
    let b = fx.product("B", 1599, 5).await;

    let service = OrderService::new(SellOutLedger {
        db: fx.db().clone(),
        sold_out: b.id,
    });

    let err = service
        .place_order_lines(&[(a.id.0, 3), (b.id.0, 2)])
        .await
        .unwrap_err();

    match &err {
        OrderError::InsufficientStock(name) => assert_eq!(name, "B"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_retryable());

    // A was decremented inside the aborted transaction only.
    assert_eq!(fx.stock(&a).await, 10);
    assert_eq!(fx.stock(&b).await, 0);
    assert!(fx.db().get_all().await.unwrap().is_empty());
    assert!(service.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn selling_out_an_unordered_product_does_not_block_placement() {
    let fx = SqliteFixture::new().await;
    let a = fx.product("A", 1099, 10).await;
    let b = fx.product("B", 1599, 5).await;

    let service = OrderService::new(SellOutLedger {
        db: fx.db().clone(),
        sold_out: a.id,
    });

    let order = service.place_order_lines(&[(b.id.0, 2)]).await.unwrap();

    assert_eq!(order.items.len(), 1);
    assert_eq!(fx.stock(&a).await, 0);
    assert_eq!(fx.stock(&b).await, 3);
    assert_eq!(fx.db().get_all().await.unwrap(), vec![order]);
}
