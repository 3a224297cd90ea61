//! # Schema Migrations
//!
//! The SQL under `migrations/sqlite/` is compiled into the crate, so a
//! binary can create its own database from nothing.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database::new ──► MIGRATOR.run(pool)                                   │
//! │                      │                                                  │
//! │                      ├── _sqlx_migrations knows 001? ── yes ──► skip    │
//! │                      │                                                  │
//! │                      └── no ──► apply in a transaction, record checksum │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Applied files are checksummed. Schema changes go in a new
//! `NNN_description.sql`; editing an applied file makes startup fail.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every embedded migration the database has not seen yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying pending migrations");
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// `(embedded, applied)` migration counts. A database that was never
/// migrated has no bookkeeping table and reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((embedded, usize::try_from(applied).unwrap_or(0)))
}
