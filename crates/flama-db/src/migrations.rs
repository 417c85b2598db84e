//! # Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary,
//! so a fresh machine only needs the `flama` executable. sqlx records
//! applied versions in `_sqlx_migrations` and skips them on later runs.
//!
//! New schema changes go in a new `NNNN_description.sql` file; applied
//! files are checksummed and must not be edited.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every embedded migration not yet recorded.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (embedded, applied) = migration_status(pool).await?;
    if applied < embedded {
        info!(pending = embedded - applied, "Applying migrations");
    } else {
        debug!(embedded, "Schema is current");
    }

    // Also verifies checksums of the applied ones
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// `(embedded, applied)` counts. A database that never ran a migration
/// has no bookkeeping table and reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    if tables == 0 {
        return Ok((embedded, 0));
    }

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((embedded, applied as usize))
}
