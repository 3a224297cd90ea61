//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Catalog CRUD (list, get, insert, delete)
//! - Atomic conditional stock decrement
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compare in the application, then write                 │
//! │     SELECT stock FROM products WHERE id = ?      → 5                    │
//! │     UPDATE products SET stock = 2 WHERE id = ?                          │
//! │     (two buyers both read 5 and both "succeed")                         │
//! │                                                                         │
//! │  ✅ CORRECT: compare and decrement in one statement                     │
//! │     UPDATE products SET stock = stock - ?2                              │
//! │     WHERE id = ?1 AND stock >= ?2                                       │
//! │     RETURNING stock                                                     │
//! │                                                                         │
//! │  No row back? A second SELECT tells "missing" from "not enough".        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use orderflow_core::store::StockDecrement;
use orderflow_core::validation::validate_new_product;
use orderflow_core::{Money, NewProduct, Product, ProductId, Quantity};

/// Row shape of the `products` table.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price_cents: i64,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: Money::from_cents(row.price_cents),
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, price_cents, stock, created_at, updated_at
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get_by_id(ProductId(1)).await?;
/// let outcome = repo.decrement_stock(ProductId(1), quantity).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: ProductId) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Lists the whole catalog ordered by id.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Inserts a new product.
    ///
    /// The payload goes through [`validate_new_product`] first, so a blank
    /// or overlong name never reaches the table. The CHECK constraints stay
    /// as the last line for writes that bypass this method.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its assigned id and timestamps
    /// * `Err(DbError::Invalid)` - Name, price or stock failed validation
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product)?;
        debug!(name = %product.name, stock = product.stock, "Inserting product");

        let now = Utc::now();

        let row: ProductRow = sqlx::query_as(
            r#"
            INSERT INTO products (name, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            RETURNING id, name, price_cents, stock, created_at, updated_at
            "#,
        )
        .bind(product.name.trim())
        .bind(product.price.cents())
        .bind(product.stock)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Deletes a product.
    ///
    /// Order items that reference the product keep their `product_id`
    /// and price snapshot.
    ///
    /// ## Returns
    /// * `Ok(())` - Product deleted
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn delete(&self, id: ProductId) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Decrements stock by `amount` if the current stock covers it.
    ///
    /// A single statement; safe to call concurrently from many connections.
    pub async fn decrement_stock(&self, id: ProductId, amount: Quantity) -> DbResult<StockDecrement> {
        let mut conn = self.pool.acquire().await?;
        decrement_stock(&mut conn, id, amount).await
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (shared with the ledger transaction)
// =============================================================================

pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: ProductId,
) -> DbResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Product::from))
}

pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: ProductId,
    amount: Quantity,
) -> DbResult<StockDecrement> {
    let now = Utc::now();

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock = stock - ?2,
            updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        RETURNING stock
        "#,
    )
    .bind(id)
    .bind(amount.get())
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(remaining) = remaining {
        debug!(id = %id, amount = %amount, remaining, "Stock decremented");
        return Ok(StockDecrement::Applied { remaining });
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let outcome = match available {
        Some(available) => StockDecrement::Insufficient { available },
        None => StockDecrement::ProductMissing,
    };
    debug!(id = %id, amount = %amount, ?outcome, "Stock decrement refused");
    Ok(outcome)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use orderflow_core::validation::{validate_quantity, OrderLimits};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn qty(n: i64) -> Quantity {
        validate_quantity(n, &OrderLimits::default()).unwrap()
    }

    fn widget(stock: i64) -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            price: Money::from_cents(1099),
            stock,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        let inserted = repo.insert(&widget(10)).await.unwrap();
        let fetched = repo.get_by_id(inserted.id).await.unwrap().unwrap();

        assert_eq!(fetched, inserted);
        assert_eq!(fetched.price, Money::from_cents(1099));
        assert!(repo.get_by_id(ProductId(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_is_ordered_by_id() {
        let db = db().await;
        let repo = db.products();

        let a = repo.insert(&widget(1)).await.unwrap();
        let b = repo.insert(&widget(2)).await.unwrap();

        let ids: Vec<ProductId> = repo.list_all().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = db().await;
        let repo = db.products();

        let product = repo.insert(&widget(1)).await.unwrap();
        repo.delete(product.id).await.unwrap();

        assert!(repo.get_by_id(product.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_fields() {
        let db = db().await;
        let repo = db.products();

        let blank = NewProduct {
            name: "   ".to_string(),
            ..widget(1)
        };
        let negative_price = NewProduct {
            price: Money::from_cents(-1),
            ..widget(1)
        };

        for product in [blank, negative_price, widget(-1)] {
            let err = repo.insert(&product).await.unwrap_err();
            assert!(matches!(err, DbError::Invalid(_)), "{product:?}");
        }
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_negative_stock_is_rejected_by_schema() {
        let db = db().await;
        let repo = db.products();
        let product = repo.insert(&widget(1)).await.unwrap();

        let err = sqlx::query("UPDATE products SET stock = -1 WHERE id = ?1")
            .bind(product.id.0)
            .execute(&repo.pool)
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn test_decrement_stock_outcomes() {
        let db = db().await;
        let repo = db.products();
        let product = repo.insert(&widget(5)).await.unwrap();

        assert_eq!(
            repo.decrement_stock(product.id, qty(3)).await.unwrap(),
            StockDecrement::Applied { remaining: 2 }
        );
        assert_eq!(
            repo.decrement_stock(product.id, qty(3)).await.unwrap(),
            StockDecrement::Insufficient { available: 2 }
        );
        assert_eq!(
            repo.decrement_stock(product.id, qty(2)).await.unwrap(),
            StockDecrement::Applied { remaining: 0 }
        );
        assert_eq!(
            repo.decrement_stock(ProductId(404), qty(1)).await.unwrap(),
            StockDecrement::ProductMissing
        );

        let after = repo.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 0);
        assert!(after.updated_at >= product.updated_at);
    }
}
