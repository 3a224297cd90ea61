//! # Storage Errors
//!
//! What can go wrong below the store contracts, and how it is reported above them.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (orderflow-core) ← What the store contracts report          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderError::PersistenceFailure ← What callers of the workflow see      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use orderflow_core::{StoreError, ValidationError};
use sqlx::error::ErrorKind as SqlxErrorKind;
use thiserror::Error;

/// Failures of the SQLite repositories.
///
/// Callers of the workflow never see these directly; they arrive as a
/// [`StoreError`] inside `OrderError::PersistenceFailure`.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the key. Raised by deletes and `fetch_one`; lookups
    /// return `Option` instead.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A catalog write failed field validation before reaching SQL.
    #[error("Invalid value: {0}")]
    Invalid(#[from] ValidationError),

    /// A UNIQUE index rejected the write.
    ///
    /// ## When This Occurs
    /// - Inserting an order with a transaction id that already exists
    #[error("Duplicate value for {field}")]
    UniqueViolation { field: String },

    /// CHECK, NOT NULL or foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Stock would go negative through a direct write
    /// - A status outside the enumeration reaches the table
    /// - An item references an order that doesn't exist
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// The database file is locked by another writer past the busy timeout.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// The file could not be opened, or the pool is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored value could not be turned back into a domain value.
    #[error("Corrupt {column} value: {reason}")]
    CorruptRow { column: String, reason: String },

    /// Transaction failed to begin, commit or roll back.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Driver failure outside the other categories (I/O, protocol, decode).
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// `NotFound` for `entity` with key `id`.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn corrupt(column: impl Into<String>, reason: impl ToString) -> Self {
        DbError::CorruptRow {
            column: column.into(),
            reason: reason.to_string(),
        }
    }
}

/// ## Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → by constraint kind, or Busy for SQLITE_BUSY/LOCKED
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                match db_err.kind() {
                    SqlxErrorKind::UniqueViolation => {
                        // "UNIQUE constraint failed: <table>.<column>"
                        let field = msg
                            .split("UNIQUE constraint failed: ")
                            .nth(1)
                            .unwrap_or("unknown")
                            .to_string();
                        DbError::UniqueViolation { field }
                    }
                    SqlxErrorKind::ForeignKeyViolation
                    | SqlxErrorKind::CheckViolation
                    | SqlxErrorKind::NotNullViolation => {
                        DbError::ConstraintViolation { message: msg }
                    }
                    _ => {
                        // SQLITE_BUSY = 5, SQLITE_LOCKED = 6 (plus extended codes)
                        let busy = db_err
                            .code()
                            .and_then(|code| code.parse::<i32>().ok())
                            .map(|code| matches!(code & 0xff, 5 | 6))
                            .unwrap_or(false);
                        if busy {
                            DbError::Busy(msg)
                        } else {
                            DbError::QueryFailed(msg)
                        }
                    }
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Maps database failures onto the store contract's error categories.
///
/// ```text
/// Busy, PoolExhausted, ConnectionFailed     → StoreError::Unavailable
/// Invalid, UniqueViolation,
/// ConstraintViolation                       → StoreError::Constraint
/// everything else                           → StoreError::Backend
/// ```
impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Busy(_) | DbError::PoolExhausted | DbError::ConnectionFailed(_) => {
                StoreError::Unavailable(err.to_string())
            }
            DbError::Invalid(_)
            | DbError::UniqueViolation { .. }
            | DbError::ConstraintViolation { .. } => {
                StoreError::Constraint(err.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
