//! Concurrent placements against one SQLite file.

mod common;

use std::sync::Arc;

use common::SqliteFixture;
use orderflow_core::{ErrorKind, OrderError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scenario_b_two_orders_race_for_the_last_units() {
    let fx = SqliteFixture::new().await;
    let product = fx.product("Product 1", 1099, 5).await;

    let first = fx.service.clone();
    let second = fx.service.clone();
    let lines = [(product.id.0, 3)];

    let (a, b) = tokio::join!(
        tokio::spawn(async move { first.place_order_lines(&lines).await }),
        tokio::spawn(async move { second.place_order_lines(&lines).await }),
    );
    let results = [a.unwrap(), b.unwrap()];

    let placed: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let refused: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();

    assert_eq!(placed.len(), 1);
    assert_eq!(refused.len(), 1);
    assert!(matches!(refused[0], OrderError::InsufficientStock(name) if name == "Product 1"));

    assert_eq!(fx.stock(&product).await, 2);
    assert_eq!(fx.service.list_orders().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stock_is_conserved_under_contention() {
    let fx = Arc::new(SqliteFixture::new().await);
    let hot = fx.product("Hot Item", 500, 20).await;
    let cold = fx.product("Cold Item", 300, 1000).await;

    let mut handles = Vec::new();
    for i in 0..16_i64 {
        let fx = Arc::clone(&fx);
        let quantity = i % 3 + 1;
        let lines = vec![(hot.id.0, quantity), (cold.id.0, 1)];
        handles.push(tokio::spawn(async move {
            fx.service.place_order_lines(&lines).await
        }));
    }

    let mut hot_sold = 0;
    let mut cold_sold = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => {
                hot_sold += order.items[0].quantity;
                cold_sold += order.items[1].quantity;
                assert_eq!(order.computed_total(), Some(order.total));
            }
            Err(err) => assert_eq!(err.kind(), ErrorKind::InsufficientStock, "{err}"),
        }
    }

    let hot_left = fx.stock(&hot).await;
    let cold_left = fx.stock(&cold).await;
    assert!(hot_left >= 0);
    assert_eq!(hot_left + hot_sold, 20);
    assert_eq!(cold_left + cold_sold, 1000);

    let orders = fx.service.list_orders().await.unwrap();
    let recorded: i64 = orders
        .iter()
        .flat_map(|order| &order.items)
        .filter(|item| item.product_id == hot.id)
        .map(|item| item.quantity)
        .sum();
    assert_eq!(recorded, hot_sold);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_memory_ledger_serializes_placements() {
    let service = common::memory_service().await;
    let product = common::memory_product(&service, "Limited", 100, 7).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = service.clone();
        let id = product.id.0;
        handles.push(tokio::spawn(async move {
            service.place_order_lines(&[(id, 1)]).await
        }));
    }

    let mut placed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            placed += 1;
        }
    }

    assert_eq!(placed, 7);
    let remaining = service.ledger().products().await;
    assert_eq!(remaining[0].stock, 0);
}
