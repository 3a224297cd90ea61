//! # Validation Module
//!
//! Turns raw input into typed values whose construction proves validity.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (not in this repo)                                  │
//! │  └── JSON shape, types                                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── PlaceOrderRequest::parse - non-empty, positive quantities          │
//! │  └── Catalog field checks (name, price, stock)                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK (stock >= 0), CHECK (quantity > 0)                           │
//! │  └── UNIQUE (transaction_id)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Code past this module never re-checks "is the list empty" or "is the
//! quantity positive": a [`PlaceOrderRequest`] cannot exist otherwise.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewProduct, ProductId, Quantity};
use crate::MAX_PRODUCT_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Limits
// =============================================================================

/// Upper bounds applied while parsing an order request.
///
/// The default imposes no caps: any non-empty list of positive quantities
/// is a valid request, and stock alone decides whether it can be filled.
/// Deployments that want to stop oversized requests early set tighter
/// bounds through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLimits {
    pub max_lines: usize,
    pub max_quantity: i64,
}

impl OrderLimits {
    pub const UNLIMITED: OrderLimits = OrderLimits {
        max_lines: usize::MAX,
        max_quantity: i64::MAX,
    };
}

impl Default for OrderLimits {
    fn default() -> Self {
        OrderLimits::UNLIMITED
    }
}

// =============================================================================
// Place Order Request
// =============================================================================

/// One requested line: a product and a positive quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// A non-empty, ordered list of valid order lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceOrderRequest {
    lines: Vec<OrderLine>,
}

impl PlaceOrderRequest {
    /// Builds a request from raw `(product_id, quantity)` pairs.
    ///
    /// ## Rules
    /// - At least one line, at most `limits.max_lines`
    /// - Every quantity in `1..=limits.max_quantity`
    /// - Submission order is preserved
    ///
    /// ## Example
    /// ```rust
    /// use orderflow_core::validation::{OrderLimits, PlaceOrderRequest};
    /// use orderflow_core::ProductId;
    ///
    /// let limits = OrderLimits::default();
    /// assert!(PlaceOrderRequest::parse(&[(ProductId(1), 2)], &limits).is_ok());
    /// assert!(PlaceOrderRequest::parse(&[(ProductId(1), 0)], &limits).is_err());
    /// ```
    pub fn parse(raw: &[(ProductId, i64)], limits: &OrderLimits) -> ValidationResult<Self> {
        if raw.is_empty() {
            return Err(ValidationError::Required {
                field: "order lines".to_string(),
            });
        }

        if raw.len() > limits.max_lines {
            return Err(ValidationError::TooMany {
                field: "order lines".to_string(),
                max: limits.max_lines,
            });
        }

        let lines = raw
            .iter()
            .map(|&(product_id, qty)| {
                Ok(OrderLine {
                    product_id,
                    quantity: validate_quantity(qty, limits)?,
                })
            })
            .collect::<ValidationResult<Vec<_>>>()?;

        Ok(PlaceOrderRequest { lines })
    }

    /// The lines in submission order. Never empty.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `limits.max_quantity`
pub fn validate_quantity(qty: i64, limits: &OrderLimits) -> ValidationResult<Quantity> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > limits.max_quantity {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: limits.max_quantity,
        });
    }

    Ok(Quantity::new_unchecked(qty))
}

/// Validates a unit price. Zero is allowed (free items).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name: non-blank, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a catalog insert payload.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_price(product.price)?;
    validate_stock(product.stock)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order() {
        let request = PlaceOrderRequest::parse(
            &[(ProductId(3), 1), (ProductId(1), 2), (ProductId(2), 3)],
            &OrderLimits::default(),
        )
        .unwrap();

        let ids: Vec<i64> = request.lines().iter().map(|l| l.product_id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(request.lines()[2].quantity.get(), 3);
    }

    #[test]
    fn test_parse_rejects_empty() {
        let err = PlaceOrderRequest::parse(&[], &OrderLimits::default()).unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
    }

    #[test]
    fn test_parse_rejects_non_positive_quantity() {
        let limits = OrderLimits::default();
        for qty in [0, -1, i64::MIN] {
            let err =
                PlaceOrderRequest::parse(&[(ProductId(1), 1), (ProductId(2), qty)], &limits)
                    .unwrap_err();
            assert!(matches!(err, ValidationError::MustBePositive { .. }));
        }
    }

    #[test]
    fn test_default_limits_accept_large_orders() {
        let many: Vec<(ProductId, i64)> = (1..=250).map(|id| (ProductId(id), 1)).collect();
        let request = PlaceOrderRequest::parse(&many, &OrderLimits::default()).unwrap();
        assert_eq!(request.lines().len(), 250);

        let bulk = PlaceOrderRequest::parse(&[(ProductId(1), 1_000_000)], &OrderLimits::default())
            .unwrap();
        assert_eq!(bulk.lines()[0].quantity.get(), 1_000_000);
        assert!(validate_quantity(i64::MAX, &OrderLimits::default()).is_ok());
    }

    #[test]
    fn test_parse_applies_limits() {
        let limits = OrderLimits {
            max_lines: 2,
            max_quantity: 10,
        };

        let too_many = [(ProductId(1), 1), (ProductId(2), 1), (ProductId(3), 1)];
        assert!(matches!(
            PlaceOrderRequest::parse(&too_many, &limits),
            Err(ValidationError::TooMany { max: 2, .. })
        ));

        assert!(matches!(
            PlaceOrderRequest::parse(&[(ProductId(1), 11)], &limits),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(PlaceOrderRequest::parse(&[(ProductId(1), 10)], &limits).is_ok());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Widget").is_ok());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        let mut product = NewProduct {
            name: "Widget".to_string(),
            price: Money::from_cents(1099),
            stock: 5,
        };
        assert!(validate_new_product(&product).is_ok());

        product.price = Money::from_cents(-1);
        assert!(validate_new_product(&product).is_err());

        product.price = Money::zero();
        product.stock = -3;
        assert!(validate_new_product(&product).is_err());
    }
}
