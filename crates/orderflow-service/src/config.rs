//! # Service Configuration
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults.
//!
//! ## Environment Variables
//! | Variable                       | Default                          |
//! |--------------------------------|----------------------------------|
//! | `ORDERFLOW_DATABASE_PATH`      | `orderflow.db`                   |
//! | `ORDERFLOW_MAX_CONNECTIONS`    | `5`                              |
//! | `ORDERFLOW_MAX_ORDER_LINES`    | unset: no cap                    |
//! | `ORDERFLOW_MAX_LINE_QUANTITY`  | unset: no cap                    |
//! | `ORDERFLOW_STATUS_POLICY`      | `permissive` (or `forward_only`) |
//! | `ORDERFLOW_COMMIT_TIMEOUT_MS`  | `5000`                           |
//! | `ORDERFLOW_LOG`                | `info,orderflow=debug,sqlx=warn` |
//!
//! Configuration is read once at startup and never changes afterwards.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use orderflow_core::validation::OrderLimits;
use orderflow_core::TransitionPolicy;
use orderflow_db::DbConfig;

use crate::telemetry::DEFAULT_LOG_FILTER;

pub const ENV_DATABASE_PATH: &str = "ORDERFLOW_DATABASE_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "ORDERFLOW_MAX_CONNECTIONS";
pub const ENV_MAX_ORDER_LINES: &str = "ORDERFLOW_MAX_ORDER_LINES";
pub const ENV_MAX_LINE_QUANTITY: &str = "ORDERFLOW_MAX_LINE_QUANTITY";
pub const ENV_STATUS_POLICY: &str = "ORDERFLOW_STATUS_POLICY";
pub const ENV_COMMIT_TIMEOUT_MS: &str = "ORDERFLOW_COMMIT_TIMEOUT_MS";
pub const ENV_LOG: &str = "ORDERFLOW_LOG";

/// Order service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size for the SQLite store
    pub max_connections: u32,

    /// Bounds applied when parsing order requests
    pub limits: OrderLimits,

    /// Which status changes are accepted
    pub status_policy: TransitionPolicy,

    /// Deadline for the transactional part of a placement
    pub commit_timeout: Duration,

    /// `tracing_subscriber::EnvFilter` directives
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: PathBuf::from("orderflow.db"),
            max_connections: 5,
            limits: OrderLimits::UNLIMITED,
            status_policy: TransitionPolicy::Permissive,
            commit_timeout: Duration::from_millis(5_000),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of a
    /// variable or `None` when it is unset.
    ///
    /// ## Example
    /// ```rust
    /// use orderflow_service::config::ServiceConfig;
    ///
    /// let config = ServiceConfig::from_lookup(|name| match name {
    ///     "ORDERFLOW_STATUS_POLICY" => Some("forward_only".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.max_connections, 5);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            database_path: lookup(ENV_DATABASE_PATH)
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_positive(&lookup, ENV_MAX_CONNECTIONS, defaults.max_connections)?,

            limits: OrderLimits {
                max_lines: parse_positive(&lookup, ENV_MAX_ORDER_LINES, defaults.limits.max_lines)?,
                max_quantity: parse_positive(
                    &lookup,
                    ENV_MAX_LINE_QUANTITY,
                    defaults.limits.max_quantity,
                )?,
            },

            status_policy: match lookup(ENV_STATUS_POLICY) {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(ENV_STATUS_POLICY.to_string()))?,
                None => defaults.status_policy,
            },

            commit_timeout: Duration::from_millis(parse_positive(
                &lookup,
                ENV_COMMIT_TIMEOUT_MS,
                5_000u64,
            )?),

            log_filter: lookup(ENV_LOG)
                .filter(|filter| !filter.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        };

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

/// Parses a strictly positive number, falling back to `default` when unset.
fn parse_positive<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };

    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))?;

    if value <= T::default() {
        return Err(ConfigError::InvalidValue(name.to_string()));
    }

    Ok(value)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[]).unwrap();

        assert_eq!(config.database_path, PathBuf::from("orderflow.db"));
        assert_eq!(config.limits, OrderLimits::UNLIMITED);
        assert_eq!(config.status_policy, TransitionPolicy::Permissive);
        assert_eq!(config.commit_timeout, Duration::from_secs(5));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (ENV_DATABASE_PATH, "/var/lib/orderflow/orders.db"),
            (ENV_MAX_CONNECTIONS, "12"),
            (ENV_MAX_ORDER_LINES, "20"),
            (ENV_MAX_LINE_QUANTITY, "50"),
            (ENV_STATUS_POLICY, "forward_only"),
            (ENV_COMMIT_TIMEOUT_MS, "250"),
            (ENV_LOG, "warn"),
        ])
        .unwrap();

        assert_eq!(config.max_connections, 12);
        assert_eq!(
            config.limits,
            OrderLimits {
                max_lines: 20,
                max_quantity: 50
            }
        );
        assert_eq!(config.status_policy, TransitionPolicy::ForwardOnly);
        assert_eq!(config.commit_timeout, Duration::from_millis(250));
        assert_eq!(config.log_filter, "warn");

        let db = config.db_config();
        assert_eq!(db.max_connections, 12);
        assert_eq!(db.database_path, PathBuf::from("/var/lib/orderflow/orders.db"));
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let cases = [
            (ENV_MAX_CONNECTIONS, "many"),
            (ENV_MAX_CONNECTIONS, "0"),
            (ENV_MAX_ORDER_LINES, "-3"),
            (ENV_MAX_LINE_QUANTITY, "0"),
            (ENV_STATUS_POLICY, "strict"),
            (ENV_COMMIT_TIMEOUT_MS, "soon"),
        ];

        for (name, value) in cases {
            assert_eq!(
                load(&[(name, value)]).unwrap_err(),
                ConfigError::InvalidValue(name.to_string()),
                "{name}={value}"
            );
        }
    }
}
