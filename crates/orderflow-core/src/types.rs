//! # Domain Types
//!
//! Core domain types used throughout the order workflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │    Product      │   │      Order       │   │   OrderItem     │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  id             │   │  id              │◄──│  order_id       │      │
//! │  │  name           │   │  transaction_id  │   │  product_id ┄┄┄┼┄┄►  │
//! │  │  price          │   │  total           │   │  quantity       │ weak │
//! │  │  stock          │   │  status          │   │  unit_price     │ ref  │
//! │  └─────────────────┘   └──────────────────┘   └─────────────────┘      │
//! │                                                                         │
//! │  Order exclusively owns its items. An item refers to its product by    │
//! │  id only and keeps its own copy of the price.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every order has:
//! - `id`: integer key assigned by the store, used for relations and updates
//! - `transaction_id`: UUID v4 assigned once at placement, the external handle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::status::OrderStatus;

// =============================================================================
// Identifiers
// =============================================================================

/// Store-assigned product key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Store-assigned order key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Opaque, globally unique handle of an order.
///
/// Generated once when the order is placed and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Generates a fresh random (v4) transaction identifier.
    pub fn generate() -> Self {
        TransactionId(Uuid::new_v4())
    }

    /// Parses the canonical hyphenated form.
    ///
    /// ## Example
    /// ```rust
    /// use orderflow_core::TransactionId;
    ///
    /// assert!(TransactionId::parse("550e8400-e29b-41d4-a716-446655440000").is_ok());
    /// assert!(TransactionId::parse("not-a-token").is_err());
    /// ```
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ValidationError::Required {
                field: "transaction_id".to_string(),
            });
        }

        Uuid::parse_str(token)
            .map(TransactionId)
            .map_err(|_| ValidationError::InvalidFormat {
                field: "transaction_id".to_string(),
                reason: "must be a valid UUID".to_string(),
            })
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for TransactionId {
    fn from(uuid: Uuid) -> Self {
        TransactionId(uuid)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// A strictly positive number of units.
///
/// Only [`crate::validation`] can construct one, so holding a `Quantity`
/// means the value was checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub(crate) const fn new_unchecked(value: i64) -> Self {
        Quantity(value)
    }

    #[inline]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,

    /// Display name; reported verbatim in stock errors.
    pub name: String,

    /// Current unit price.
    pub price: Money,

    /// Units available. Never negative.
    pub stock: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether the current stock covers `quantity` units.
    #[inline]
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        quantity <= self.stock
    }
}

/// Catalog insert payload. The store assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

// =============================================================================
// Order Item
// =============================================================================

/// A line of a persisted order.
///
/// `unit_price` is the product price at placement time and is never
/// refreshed from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// `unit_price × quantity`, or `None` if it does not fit in an `i64`.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul_quantity(self.quantity)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A persisted order with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub transaction_id: TransactionId,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Recomputes the total from the stored items; `None` on overflow.
    ///
    /// For every order the workflow creates this is `Some(order.total)`.
    pub fn computed_total(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::zero(), |acc, item| {
            acc.checked_add(item.line_total()?)
        })
    }

    /// Number of units across all items; `None` on overflow.
    pub fn unit_count(&self) -> Option<i64> {
        self.items
            .iter()
            .try_fold(0_i64, |acc, item| acc.checked_add(item.quantity))
    }
}

// =============================================================================
// New Order (priced, not yet persisted)
// =============================================================================

/// A priced line waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    /// Product name at pricing time; used for stock error messages.
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl NewOrderItem {
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul_quantity(self.quantity.get())
    }
}

/// A fully priced order, ready for the atomic commit.
///
/// Always persisted with [`OrderStatus::Pending`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub transaction_id: TransactionId,
    pub items: Vec<NewOrderItem>,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
}

impl NewOrder {
    /// Initial status of every placed order.
    pub const STATUS: OrderStatus = OrderStatus::Pending;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, unit_price: i64) -> OrderItem {
        OrderItem {
            id: 1,
            order_id: OrderId(1),
            product_id: ProductId(1),
            quantity,
            unit_price: Money::from_cents(unit_price),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_transaction_ids_are_unique() {
        let a = TransactionId::generate();
        let b = TransactionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_transaction_id_display_parses_back() {
        let id = TransactionId::generate();
        assert_eq!(TransactionId::parse(&id.to_string()), Ok(id));
    }

    #[test]
    fn test_transaction_id_rejects_blank() {
        assert!(matches!(
            TransactionId::parse("  "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_order_computed_total() {
        let now = Utc::now();
        let order = Order {
            id: OrderId(1),
            transaction_id: TransactionId::generate(),
            items: vec![item(3, 1099), item(2, 1599)],
            total: Money::from_cents(3 * 1099 + 2 * 1599),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(order.computed_total(), Some(order.total));
        assert_eq!(order.unit_count(), Some(5));
    }

    #[test]
    fn test_computed_total_reports_overflow() {
        let now = Utc::now();
        let order = Order {
            id: OrderId(1),
            transaction_id: TransactionId::generate(),
            items: vec![item(2, i64::MAX / 2 + 1), item(1, 1)],
            total: Money::zero(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(order.items[0].line_total(), None);
        assert_eq!(order.computed_total(), None);

        let order = Order {
            items: vec![item(1, i64::MAX), item(1, 1)],
            ..order
        };
        assert_eq!(order.computed_total(), None);
        assert_eq!(order.unit_count(), Some(2));
    }

    #[test]
    fn test_can_fulfil() {
        let now = Utc::now();
        let product = Product {
            id: ProductId(1),
            name: "Widget".to_string(),
            price: Money::from_cents(500),
            stock: 5,
            created_at: now,
            updated_at: now,
        };

        assert!(product.can_fulfil(5));
        assert!(!product.can_fulfil(6));
    }

    #[test]
    fn test_identifiers_serialize_transparently() {
        assert_eq!(serde_json::to_string(&ProductId(7)).unwrap(), "7");
        let id = TransactionId::generate();
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            format!("\"{}\"", id)
        );
    }
}
