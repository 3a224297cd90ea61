//! # Pricing
//!
//! Stock checks, price snapshots and exact totals for an order request.
//!
//! ## Per-Line Flow
//! ```text
//! (product, quantity)
//!      │
//!      ├── demand for this product so far + quantity > stock?
//!      │        └── InsufficientStock(product.name)
//!      │
//!      ├── line_total = product.price × quantity     (checked)
//!      ├── total     += line_total                   (checked)
//!      └── snapshot product.price into the item
//! ```
//!
//! Lines are processed in submission order, so the first line that cannot
//! be covered is the one reported. Demand is accumulated per product, which
//! means two lines for the same product are checked against stock together.
//!
//! Product lookup belongs to the caller: the order service fetches each
//! product from its store and feeds the lines to [`OrderQuote::add_line`].

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::{OrderError, OrderResult, ValidationError};
use crate::money::Money;
use crate::types::{NewOrder, NewOrderItem, Product, ProductId, Quantity, TransactionId};

/// Running price calculation for one order.
#[derive(Debug, Default)]
pub struct OrderQuote {
    items: Vec<NewOrderItem>,
    total: Money,
    demand: HashMap<ProductId, i64>,
}

impl OrderQuote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks stock for one line and adds it to the quote.
    ///
    /// ## Returns
    /// The line total on success. On failure the quote is left unchanged.
    pub fn add_line(&mut self, product: &Product, quantity: Quantity) -> OrderResult<Money> {
        let already = self.demand.get(&product.id).copied().unwrap_or(0);
        let demanded = already
            .checked_add(quantity.get())
            .ok_or_else(|| overflow("quantity"))?;

        if !product.can_fulfil(demanded) {
            return Err(OrderError::InsufficientStock(product.name.clone()));
        }

        let line_total = product
            .price
            .checked_mul_quantity(quantity.get())
            .ok_or_else(|| overflow("line total"))?;
        let total = self
            .total
            .checked_add(line_total)
            .ok_or_else(|| overflow("order total"))?;

        self.total = total;
        self.demand.insert(product.id, demanded);
        self.items.push(NewOrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
        });

        Ok(line_total)
    }

    /// Current total of all accepted lines.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Finishes the quote as an order ready for the atomic commit.
    pub fn into_new_order(self, transaction_id: TransactionId, placed_at: DateTime<Utc>) -> NewOrder {
        NewOrder {
            transaction_id,
            items: self.items,
            total: self.total,
            placed_at,
        }
    }
}

fn overflow(field: &str) -> OrderError {
    OrderError::InvalidRequest(ValidationError::Overflow {
        field: field.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{validate_quantity, OrderLimits};

    fn product(id: i64, name: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId(id),
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    fn qty(n: i64) -> Quantity {
        validate_quantity(n, &OrderLimits::default()).unwrap()
    }

    #[test]
    fn test_total_is_exact_sum_of_lines() {
        let p1 = product(1, "Product 1", 1099, 100);
        let p2 = product(2, "Product 2", 1599, 50);
        let mut quote = OrderQuote::new();

        assert_eq!(quote.add_line(&p1, qty(2)).unwrap(), Money::from_cents(2198));
        assert_eq!(quote.add_line(&p2, qty(1)).unwrap(), Money::from_cents(1599));
        assert_eq!(quote.total(), Money::from_cents(2 * 1099 + 1599));

        let order = quote.into_new_order(TransactionId::generate(), Utc::now());
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total, Money::from_cents(3797));
    }

    #[test]
    fn test_price_is_snapshotted_per_item() {
        let mut p2 = product(2, "Product 2", 1599, 50);
        let mut quote = OrderQuote::new();
        quote.add_line(&p2, qty(3)).unwrap();

        // A later price change does not touch the quoted line.
        p2.price = Money::from_cents(9999);

        let order = quote.into_new_order(TransactionId::generate(), Utc::now());
        assert_eq!(order.items[0].unit_price, Money::from_cents(1599));
        assert_eq!(order.items[0].product_name, "Product 2");
        assert_eq!(order.items[0].quantity.get(), 3);
    }

    #[test]
    fn test_insufficient_stock_names_the_product() {
        let scarce = product(3, "Scarce", 250, 5);
        let mut quote = OrderQuote::new();

        let err = quote.add_line(&scarce, qty(6)).unwrap_err();
        match err {
            OrderError::InsufficientStock(name) => assert_eq!(name, "Scarce"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_repeated_product_lines_share_stock() {
        let scarce = product(3, "Scarce", 250, 5);

        let mut fits = OrderQuote::new();
        fits.add_line(&scarce, qty(3)).unwrap();
        fits.add_line(&scarce, qty(2)).unwrap();
        assert_eq!(fits.total(), Money::from_cents(1250));

        let mut short = OrderQuote::new();
        short.add_line(&scarce, qty(3)).unwrap();
        assert!(matches!(
            short.add_line(&scarce, qty(3)),
            Err(OrderError::InsufficientStock(_))
        ));
    }

    #[test]
    fn test_failed_line_leaves_quote_unchanged() {
        let scarce = product(3, "Scarce", 250, 5);
        let mut quote = OrderQuote::new();

        quote.add_line(&scarce, qty(2)).unwrap();
        assert!(quote.add_line(&scarce, qty(9)).is_err());
        assert_eq!(quote.total(), Money::from_cents(500));

        // The refused demand was not recorded either.
        quote.add_line(&scarce, qty(3)).unwrap();
        assert_eq!(quote.into_new_order(TransactionId::generate(), Utc::now()).items.len(), 2);
    }

    #[test]
    fn test_large_quantity_against_enough_stock() {
        let bulk = product(4, "Bolt", 3, 5_000_000);
        let mut quote = OrderQuote::new();

        quote.add_line(&bulk, qty(4_000_000)).unwrap();
        assert_eq!(quote.total(), Money::from_cents(12_000_000));
    }

    #[test]
    fn test_overflow_is_an_invalid_request() {
        let pricey = product(1, "Pricey", i64::MAX / 2, 10);
        let mut quote = OrderQuote::new();

        let err = quote.add_line(&pricey, qty(3)).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidRequest(ValidationError::Overflow { .. })
        ));

        // Each line fits on its own; the running total does not.
        quote.add_line(&pricey, qty(1)).unwrap();
        quote.add_line(&pricey, qty(1)).unwrap();
        let err = quote.add_line(&pricey, qty(1)).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidRequest(ValidationError::Overflow { .. })
        ));
    }
}
