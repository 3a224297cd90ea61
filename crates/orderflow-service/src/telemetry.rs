//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Filter used when none is configured or the configured one is invalid.
pub const DEFAULT_LOG_FILTER: &str = "info,orderflow=debug,sqlx=warn";

/// Initializes the global tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `ORDERFLOW_LOG=debug` - Show debug messages
/// - `ORDERFLOW_LOG=orderflow_db=trace` - Per-crate directives
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
}
