//! Database layer
//!
//! Connection pool setup, the storage contracts and their SQLite and
//! in-memory implementations.

pub mod bid_repository;
pub mod memory;
pub mod organization_repository;
pub mod repository;
pub mod tender_repository;
pub mod user_repository;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};

use crate::config::DatabaseConfig;

pub use bid_repository::SqliteBidRepository;
pub use memory::MemoryStore;
pub use organization_repository::SqliteOrganizationRepository;
pub use repository::{
    BidFilter, BidRepository, OrganizationRepository, StoreError, StoreResult, TenderFilter,
    TenderRepository, UserRepository,
};
pub use tender_repository::SqliteTenderRepository;
pub use user_repository::SqliteUserRepository;

/// Database connection pool type
pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool and apply migrations
pub async fn init_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .with_context(|| format!("Invalid database URL: {}", config.url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Begin a transaction that takes the write lock before its first read.
///
/// A deferred transaction that reads and then writes fails with
/// `SQLITE_BUSY_SNAPSHOT` under WAL when another writer commits in between,
/// and `busy_timeout` does not retry that case.
pub(crate) async fn begin_write(pool: &DbPool) -> sqlx::Result<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// Round-trip a trivial query to confirm the database is reachable
pub async fn check_health(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("Database health check failed")?;
    Ok(())
}

/// Parse a stored timestamp, accepting RFC 3339 and SQLite's `CURRENT_TIMESTAMP` format
pub(crate) fn parse_db_timestamp(ts: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") {
        return DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc);
    }
    Utc::now()
}
