//! SQLite-backed cancellation signals.
//!
//! Signals live in the `cancel_signals` table so a cancel issued from one
//! process is observed by the process running the job.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::CancellationSignal;

#[derive(Clone)]
pub struct SqliteCancellationSignal {
    pool: SqlitePool,
}

impl SqliteCancellationSignal {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Fixed-width UTC form so `expires_at` compares correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl CancellationSignal for SqliteCancellationSignal {
    async fn raise(&self, job_id: Uuid, ttl: Duration) -> DomainResult<()> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| DomainError::ValidationFailed(format!("Invalid cancel TTL: {e}")))?;

        // Signals left behind by runs that exited before the cancel landed.
        let purged = sqlx::query("DELETE FROM cancel_signals WHERE expires_at <= ?")
            .bind(timestamp(now))
            .execute(&self.pool)
            .await?
            .rows_affected();
        if purged > 0 {
            tracing::debug!(purged, "dropped expired cancel signals");
        }

        sqlx::query(
            r#"INSERT INTO cancel_signals (job_id, raised_at, expires_at) VALUES (?, ?, ?)
               ON CONFLICT(job_id) DO UPDATE SET raised_at = excluded.raised_at, expires_at = excluded.expires_at"#,
        )
        .bind(job_id.to_string())
        .bind(timestamp(now))
        .bind(timestamp(now + ttl))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_raised(&self, job_id: Uuid) -> DomainResult<bool> {
        let row: Option<(String,)> = sqlx::query_as("SELECT expires_at FROM cancel_signals WHERE job_id = ?")
            .bind(job_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((expires_at,)) => Ok(super::parse_datetime(&expires_at)? > Utc::now()),
            None => Ok(false),
        }
    }

    async fn clear(&self, job_id: Uuid) -> DomainResult<()> {
        sqlx::query("DELETE FROM cancel_signals WHERE job_id = ?")
            .bind(job_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup() -> SqliteCancellationSignal {
        SqliteCancellationSignal::new(create_migrated_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_raise_and_clear() {
        let signal = setup().await;
        let job_id = Uuid::new_v4();

        assert!(!signal.is_raised(job_id).await.unwrap());
        signal.raise(job_id, Duration::from_secs(3600)).await.unwrap();
        assert!(signal.is_raised(job_id).await.unwrap());
        assert!(!signal.is_raised(Uuid::new_v4()).await.unwrap());

        signal.clear(job_id).await.unwrap();
        assert!(!signal.is_raised(job_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_signal_is_not_raised() {
        let signal = setup().await;
        let job_id = Uuid::new_v4();

        signal.raise(job_id, Duration::ZERO).await.unwrap();
        assert!(!signal.is_raised(job_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_raise_purges_expired_rows() {
        let signal = setup().await;
        let stale = Uuid::new_v4();
        let live = Uuid::new_v4();

        signal.raise(stale, Duration::ZERO).await.unwrap();
        signal.raise(live, Duration::from_secs(60)).await.unwrap();

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cancel_signals")
            .fetch_one(&signal.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
        assert!(signal.is_raised(live).await.unwrap());
    }

    #[tokio::test]
    async fn test_raise_twice_refreshes_ttl() {
        let signal = setup().await;
        let job_id = Uuid::new_v4();

        signal.raise(job_id, Duration::ZERO).await.unwrap();
        signal.raise(job_id, Duration::from_secs(60)).await.unwrap();
        assert!(signal.is_raised(job_id).await.unwrap());
    }
}
