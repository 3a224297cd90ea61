//! All-or-nothing placement when storage fails part way through.

mod common;

use common::{memory_product, memory_service};
use orderflow_core::store::{InventoryStore, OrderStore};
use orderflow_core::{ErrorKind, OrderError, StoreError};

#[tokio::test]
async fn failed_insert_restores_every_decrement() {
    let service = memory_service().await;
    let a = memory_product(&service, "Product 1", 1099, 10).await;
    let b = memory_product(&service, "Product 2", 1599, 4).await;

    service.ledger().fail_next_create();
    let err = service
        .place_order_lines(&[(a.id.0, 3), (b.id.0, 4)])
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::PersistenceFailure(StoreError::Backend(_))));
    assert!(err.is_retryable());

    let ledger = service.ledger();
    assert_eq!(ledger.get_product(a.id).await.unwrap().unwrap().stock, 10);
    assert_eq!(ledger.get_product(b.id).await.unwrap().unwrap().stock, 4);
    assert!(ledger.get_all().await.unwrap().is_empty());

    // The fault fires once; a retry goes through.
    let order = service
        .place_order_lines(&[(a.id.0, 3), (b.id.0, 4)])
        .await
        .unwrap();
    assert_eq!(order.items.len(), 2);
    assert_eq!(ledger.get_product(b.id).await.unwrap().unwrap().stock, 0);
}

#[tokio::test]
async fn failed_commit_leaves_no_trace() {
    let service = memory_service().await;
    let a = memory_product(&service, "Product 1", 1099, 10).await;

    service.ledger().fail_next_commit();
    let err = service.place_order_lines(&[(a.id.0, 2)]).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    assert!(matches!(err, OrderError::PersistenceFailure(StoreError::Unavailable(_))));

    let ledger = service.ledger();
    assert_eq!(ledger.get_product(a.id).await.unwrap().unwrap().stock, 10);
    assert!(ledger.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn removed_product_fails_placement_without_side_effects() {
    let service = memory_service().await;
    let a = memory_product(&service, "Product 1", 1099, 10).await;
    let b = memory_product(&service, "Product 2", 1599, 10).await;

    service
        .place_order_lines(&[(a.id.0, 1), (b.id.0, 1)])
        .await
        .unwrap();
    assert!(service.ledger().remove_product(b.id).await);

    let err = service
        .place_order_lines(&[(a.id.0, 1), (b.id.0, 1)])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProductNotFound);
    assert_eq!(
        service.ledger().get_product(a.id).await.unwrap().unwrap().stock,
        9
    );
    assert_eq!(service.list_orders().await.unwrap().len(), 1);
}

#[tokio::test]
async fn orders_survive_product_removal() {
    let service = memory_service().await;
    let a = memory_product(&service, "Product 1", 1099, 10).await;
    let order = service.place_order_lines(&[(a.id.0, 2)]).await.unwrap();

    service.ledger().remove_product(a.id).await;

    let seen = service
        .get_order_by_transaction_id(&order.transaction_id)
        .await
        .unwrap();
    assert_eq!(seen.items[0].product_id, a.id);
    assert_eq!(seen.total, order.total);
}

#[tokio::test]
async fn repeated_product_lines_are_checked_together() {
    let service = memory_service().await;
    let a = memory_product(&service, "Product 1", 1099, 5).await;

    let err = service
        .place_order_lines(&[(a.id.0, 3), (a.id.0, 3)])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock(ref name) if name == "Product 1"));

    let order = service
        .place_order_lines(&[(a.id.0, 2), (a.id.0, 3)])
        .await
        .unwrap();
    assert_eq!(order.total.cents(), 5 * 1099);
    assert_eq!(
        service.ledger().get_product(a.id).await.unwrap().unwrap().stock,
        0
    );
}
