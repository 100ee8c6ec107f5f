//! SQLite adapters for the job registry, outcome log and cancel signals.

pub mod cancellation;
pub mod connection;
pub mod job_repository;
pub mod migrations;
pub mod outcome_repository;

pub use cancellation::SqliteCancellationSignal;
pub use connection::{open_memory_pool, open_pool, ConnectionError, PoolSettings};
pub use job_repository::SqliteJobRepository;
pub use migrations::{migrate, schema_version, Migration, MigrationError, MIGRATIONS};
pub use outcome_repository::SqliteOutcomeRepository;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::Path;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

fn corrupt_column(column: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::SerializationError(format!("column {column}: {err}"))
}

/// Job and outcome ids are stored as hyphenated text.
pub fn parse_uuid(s: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| corrupt_column("id", e))
}

/// Timestamps are stored as RFC 3339 text in UTC.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt_column("timestamp", e))
}

/// Nullable JSON columns hold serialized reports and check results.
pub fn parse_optional_json<T: serde::de::DeserializeOwned>(s: Option<String>) -> DomainResult<Option<T>> {
    s.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| corrupt_column("json", e))
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Open the database file at `path` and bring its schema up to date.
pub async fn initialize_database(path: &Path, settings: PoolSettings) -> Result<SqlitePool, DatabaseError> {
    migrated(open_pool(path, settings).await?).await
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    migrated(open_memory_pool().await?).await
}

async fn migrated(pool: SqlitePool) -> Result<SqlitePool, DatabaseError> {
    let applied = migrate(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "database schema upgraded");
    }
    Ok(pool)
}
