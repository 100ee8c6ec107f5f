//! Schema migrations compiled into the binary.
//!
//! Applied versions are recorded in `schema_migrations`. Each migration runs
//! in its own transaction together with its bookkeeping row.

use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to read schema version: {0}")]
    Bookkeeping(#[source] sqlx::Error),
    #[error("Migration {version} ({name}) failed: {source}")]
    Apply {
        version: i64,
        name: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("Database schema version {found} is newer than this build supports ({known})")]
    SchemaTooNew { found: i64, known: i64 },
}

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Every migration, in version order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "jobs, outcomes and cancel signals",
    sql: include_str!("../../../migrations/001_initial_schema.sql"),
}];

fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Bring the schema up to date; returns how many migrations were applied.
pub async fn migrate(pool: &SqlitePool) -> Result<usize, MigrationError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await
    .map_err(MigrationError::Bookkeeping)?;

    let current = schema_version(pool).await?;
    if current > latest_version() {
        return Err(MigrationError::SchemaTooNew {
            found: current,
            known: latest_version(),
        });
    }

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(pool, migration).await?;
        tracing::debug!(version = migration.version, name = migration.name, "applied migration");
        applied += 1;
    }
    Ok(applied)
}

/// Highest applied migration version, 0 for a fresh database.
pub async fn schema_version(pool: &SqlitePool) -> Result<i64, MigrationError> {
    let (version,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .map_err(MigrationError::Bookkeeping)?;
    Ok(version)
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<(), MigrationError> {
    let failed = |source| MigrationError::Apply {
        version: migration.version,
        name: migration.name,
        source,
    };

    let mut tx = pool.begin().await.map_err(failed)?;
    sqlx::raw_sql(migration.sql).execute(&mut *tx).await.map_err(failed)?;
    sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await
        .map_err(failed)?;
    tx.commit().await.map_err(failed)
}
