//! # Error Types
//!
//! Domain-specific error types for orderflow-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  orderflow-core errors (this file)                                      │
//! │  ├── ValidationError  - Malformed input, rejected at parse time         │
//! │  ├── StoreError       - Storage could not complete an operation         │
//! │  └── OrderError       - What a caller of the workflow sees              │
//! │                                                                         │
//! │  orderflow-db errors (separate crate)                                   │
//! │  └── DbError          - sqlx failures, converted into StoreError        │
//! │                                                                         │
//! │  Flow: ValidationError ─┐                                               │
//! │        DbError → StoreError ─┴──► OrderError → caller                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, id, token)
//! 3. Errors are enum variants, never String
//! 4. Every failure is scoped to one invocation; none is fatal to the process

use thiserror::Error;

use crate::status::OrderStatus;
use crate::types::ProductId;

// =============================================================================
// Order Error
// =============================================================================

/// Errors surfaced by the order workflow.
///
/// By the time one of these reaches the caller, every partial effect of the
/// failed invocation has been rolled back.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Malformed input: empty line list, non-positive quantity,
    /// unrecognised status value. Never retried automatically.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// A requested line references a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// No order matches the given identifier or transaction token.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// A line asks for more units than the product has.
    ///
    /// ## User Workflow
    /// ```text
    /// place_order([(P1, 100)])
    ///      │
    ///      ▼
    /// Check stock: P1.stock = 5
    ///      │
    ///      ▼
    /// InsufficientStock("Widget")
    ///      │
    ///      ▼
    /// Caller may resubmit with a smaller quantity
    /// ```
    #[error("Insufficient stock for product: {0}")]
    InsufficientStock(String),

    /// The configured transition policy forbids this status change.
    #[error("Order status cannot change from {from} to {to}")]
    TransitionRejected { from: OrderStatus, to: OrderStatus },

    /// Storage could not complete the operation. Side effects are rolled
    /// back, so the whole call can be retried.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),
}

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    ProductNotFound,
    OrderNotFound,
    InsufficientStock,
    PersistenceFailure,
}

impl OrderError {
    /// Returns the category of this error.
    ///
    /// A rejected transition is a client-input fault, so it reports as
    /// [`ErrorKind::InvalidRequest`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidRequest(_) | OrderError::TransitionRejected { .. } => {
                ErrorKind::InvalidRequest
            }
            OrderError::ProductNotFound(_) => ErrorKind::ProductNotFound,
            OrderError::OrderNotFound(_) => ErrorKind::OrderNotFound,
            OrderError::InsufficientStock(_) => ErrorKind::InsufficientStock,
            OrderError::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
        }
    }

    /// Whether retrying the identical call can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::PersistenceFailure(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Produced while turning raw input into typed requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Collection has too many entries.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Arithmetic on the request would overflow.
    #[error("{field} is too large")]
    Overflow { field: String },
}

// =============================================================================
// Store Error
// =============================================================================

/// Failure reported by a storage implementation.
///
/// This is the only error type that crosses the store contracts; concrete
/// backends convert their own errors into it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store cannot be reached (closed pool, lost connection).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A storage-level constraint rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The operation did not finish before its deadline.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// Any other backend failure.
    #[error("store operation failed: {0}")]
    Backend(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for workflow results.
pub type OrderResult<T> = Result<T, OrderError>;

/// Convenience type alias for store contract results.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = OrderError::InsufficientStock("Widget".to_string());
        assert_eq!(err.to_string(), "Insufficient stock for product: Widget");

        let err = OrderError::ProductNotFound(ProductId(42));
        assert_eq!(err.to_string(), "Product not found: 42");

        let err = OrderError::TransitionRejected {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Order status cannot change from delivered to pending"
        );
    }

    #[test]
    fn test_validation_converts_to_order_error() {
        let validation_err = ValidationError::Required {
            field: "lines".to_string(),
        };
        let err: OrderError = validation_err.into();
        assert!(matches!(err, OrderError::InvalidRequest(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_only_persistence_failures_are_retryable() {
        let err: OrderError = StoreError::Unavailable("pool closed".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
        assert!(err.is_retryable());

        assert!(!OrderError::InsufficientStock("x".to_string()).is_retryable());
        assert!(!OrderError::OrderNotFound("7".to_string()).is_retryable());
    }

    #[test]
    fn test_rejected_transition_is_an_input_fault() {
        let err = OrderError::TransitionRejected {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Shipped,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }
}
