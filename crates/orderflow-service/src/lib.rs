//! # orderflow-service: Order Placement Workflow
//!
//! Places orders against live inventory so that the order, its items and
//! the stock deductions appear together or not at all.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  caller (HTTP layer, CLI, tests)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderService<L: OrderLedger>        (service.rs)                       │
//! │  ├── place_order / place_order_lines                                    │
//! │  ├── transition_order_status                                            │
//! │  └── list_orders / get_order_by_transaction_id / …                      │
//! │       │                                                                 │
//! │       ├──────────────────────────┐                                      │
//! │       ▼                          ▼                                      │
//! │  orderflow_db::Database     InMemoryLedger                              │
//! │  (SQLite, production)       (memory.rs, process-local)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use orderflow_service::{config::ServiceConfig, connect};
//!
//! let config = ServiceConfig::from_env()?;
//! let service = connect(&config).await?;
//!
//! let order = service.place_order_lines(&[(1, 2), (2, 1)]).await?;
//! service.transition_order_status(order.id, "shipped").await?;
//! ```

pub mod config;
pub mod memory;
pub mod service;
pub mod telemetry;

pub use config::{ConfigError, ServiceConfig};
pub use memory::{InMemoryLedger, InMemoryTransaction};
pub use service::OrderService;

use orderflow_db::{Database, DbResult};

/// Opens the SQLite store described by `config` (running migrations) and
/// wraps it in an [`OrderService`].
pub async fn connect(config: &ServiceConfig) -> DbResult<OrderService<Database>> {
    let db = Database::new(config.db_config()).await?;
    Ok(OrderService::from_config(db, config))
}
