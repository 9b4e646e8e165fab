//! Database Bootstrap Module
//!
//! Opens the SQLite connection pool and creates the schema on startup.
//!
//! # Storage
//! Two tables back the whole tracker:
//! - `counters`: one row per allocator name, advanced atomically
//! - `batches`: one row per batch, its timeline embedded as a JSON array
//!   so a single fetch reads the batch and its history consistently

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Open the connection pool for the given database file
///
/// The file (and its parent directory) is created if missing. The pool is
/// capped at a single connection: SQLite permits limited write concurrency,
/// and one connection serializes writers in the driver instead of failing
/// them with "database is locked" under concurrent requests.
pub async fn connect(path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }
    }

    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        // Prevent transient "database is locked" errors under concurrent access.
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await?;

    Ok(pool)
}

/// Create the schema if it does not exist yet
///
/// Runs at startup before the API server binds. Idempotent.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS counters (
            name TEXT PRIMARY KEY,
            sequence INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS batches (
            batch_id TEXT PRIMARY KEY,
            farmer_id TEXT NOT NULL,
            crop_type TEXT NOT NULL,
            quantity REAL NOT NULL,
            harvest_date TEXT NOT NULL,
            origin TEXT NOT NULL,
            current_stage TEXT NOT NULL,
            is_recalled INTEGER NOT NULL DEFAULT 0,
            integrity_hash TEXT NOT NULL,
            qr_code TEXT,
            updates TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Ownership checks and per-farmer listings filter on farmer_id.
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_batches_farmer ON batches(farmer_id)")
        .execute(pool)
        .await?;

    Ok(())
}
