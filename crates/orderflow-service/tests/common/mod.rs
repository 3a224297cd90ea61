//! Shared fixtures for the service integration tests.

#![allow(dead_code)]

use std::time::Duration;

use orderflow_core::{Money, NewProduct, Product};
use orderflow_db::{Database, DbConfig};
use orderflow_service::{InMemoryLedger, OrderService};
use tempfile::TempDir;

/// An on-disk SQLite service. Keep the `TempDir` alive for the test.
pub struct SqliteFixture {
    pub dir: TempDir,
    pub service: OrderService<Database>,
}

impl SqliteFixture {
    pub async fn new() -> Self {
        Self::with_busy_timeout(Duration::from_secs(5)).await
    }

    pub async fn with_busy_timeout(busy_timeout: Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(
            DbConfig::new(dir.path().join("orders.db"))
                .max_connections(8)
                .busy_timeout(busy_timeout),
        )
        .await
        .unwrap();

        SqliteFixture {
            dir,
            service: OrderService::new(db),
        }
    }

    pub fn db(&self) -> &Database {
        self.service.ledger()
    }

    pub async fn product(&self, name: &str, price_cents: i64, stock: i64) -> Product {
        self.db()
            .products()
            .insert(&new_product(name, price_cents, stock))
            .await
            .unwrap()
    }

    pub async fn stock(&self, product: &Product) -> i64 {
        self.db()
            .products()
            .get_by_id(product.id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }
}

pub fn new_product(name: &str, price_cents: i64, stock: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        price: Money::from_cents(price_cents),
        stock,
    }
}

pub async fn memory_service() -> OrderService<InMemoryLedger> {
    OrderService::new(InMemoryLedger::new())
}

pub async fn memory_product(
    service: &OrderService<InMemoryLedger>,
    name: &str,
    price_cents: i64,
    stock: i64,
) -> Product {
    service
        .ledger()
        .add_product(new_product(name, price_cents, stock))
        .await
        .unwrap()
}
