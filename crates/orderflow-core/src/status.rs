//! # Order Status Machine
//!
//! The closed set of order statuses and the policy deciding which changes
//! between them are accepted.
//!
//! ## Transition Graphs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Permissive (default)                                                   │
//! │    any status ──► any status                                            │
//! │                                                                         │
//! │  ForwardOnly                                                            │
//! │    pending ──► confirmed ──► shipped ──► delivered                      │
//! │       │            │            ▲                                       │
//! │       │            └──► cancelled                                       │
//! │       ├────────────────────────┘ (pending ──► shipped)                  │
//! │       └──► cancelled                                                    │
//! │                                                                         │
//! │    delivered, cancelled: terminal                                       │
//! │    setting the current status again is always accepted                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order. No value outside these five is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Freshly placed; stock is already deducted.
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns the lower-case name used in storage and on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether no further forward transition exists.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    /// Parses an exact lower-case status name.
    ///
    /// ## Example
    /// ```rust
    /// use orderflow_core::OrderStatus;
    ///
    /// assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
    /// assert!("returned".parse::<OrderStatus>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL
                    .iter()
                    .map(|status| status.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Transition Policy
// =============================================================================

/// Which status changes are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any status may be set from any status.
    #[default]
    Permissive,
    /// Only moves along the fulfilment graph (see module docs).
    ForwardOnly,
}

impl TransitionPolicy {
    /// Checks whether `from -> to` is accepted under this policy.
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::*;

        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::ForwardOnly => {
                from == to
                    || matches!(
                        (from, to),
                        (Pending, Confirmed)
                            | (Pending, Shipped)
                            | (Pending, Cancelled)
                            | (Confirmed, Shipped)
                            | (Confirmed, Cancelled)
                            | (Shipped, Delivered)
                    )
            }
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "forward_only" => Ok(TransitionPolicy::ForwardOnly),
            _ => Err(ValidationError::NotAllowed {
                field: "status policy".to_string(),
                allowed: vec!["permissive".to_string(), "forward_only".to_string()],
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
