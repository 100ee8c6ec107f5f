//! SQLite implementation of the JobRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BatchTally, Job, JobSpec, JobStatus};
use crate::domain::ports::JobRepository;

#[derive(Clone)]
pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn create(&self, job: &Job) -> DomainResult<()> {
        let spec_json = serde_json::to_string(&job.spec)?;

        sqlx::query(
            r#"INSERT INTO jobs (id, spec, status, total_files, processed_files,
               successful_transformations, failed_transformations, error, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(job.id.to_string())
        .bind(&spec_json)
        .bind(job.status.as_str())
        .bind(i64::from(job.total_files))
        .bind(i64::from(job.processed_files))
        .bind(i64::from(job.successful_transformations))
        .bind(i64::from(job.failed_transformations))
        .bind(&job.error)
        .bind(job.created_at.to_rfc3339())
        .bind(job.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Job>> {
        let row: Option<JobRow> = sqlx::query_as("SELECT * FROM jobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Job::try_from).transpose()
    }

    async fn update_status(&self, id: Uuid, status: JobStatus, error: Option<&str>) -> DomainResult<bool> {
        let predecessors: Vec<&str> = JobStatus::ALL
            .iter()
            .filter(|from| from.can_transition_to(status))
            .map(JobStatus::as_str)
            .collect();
        if predecessors.is_empty() {
            return Ok(false);
        }

        let placeholders = vec!["?"; predecessors.len()].join(", ");
        let sql = format!(
            "UPDATE jobs SET status = ?, error = COALESCE(?, error), updated_at = ? \
             WHERE id = ? AND status IN ({placeholders})"
        );

        let mut query = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(error)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string());
        for from in predecessors {
            query = query.bind(from);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_total_files(&self, id: Uuid, total: u32) -> DomainResult<()> {
        let result = sqlx::query("UPDATE jobs SET total_files = ?, updated_at = ? WHERE id = ?")
            .bind(i64::from(total))
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::JobNotFound(id));
        }
        Ok(())
    }

    async fn record_progress(&self, id: Uuid, tally: BatchTally) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE jobs SET processed_files = processed_files + ?,
               successful_transformations = successful_transformations + ?,
               failed_transformations = failed_transformations + ?,
               updated_at = ?
               WHERE id = ?"#,
        )
        .bind(i64::from(tally.processed))
        .bind(i64::from(tally.successful))
        .bind(i64::from(tally.failed))
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::JobNotFound(id));
        }
        Ok(())
    }

    async fn list(&self, status: Option<JobStatus>, limit: u32) -> DomainResult<Vec<Job>> {
        let rows: Vec<JobRow> = match status {
            Some(status) => {
                sqlx::query_as("SELECT * FROM jobs WHERE status = ? ORDER BY created_at DESC LIMIT ?")
                    .bind(status.as_str())
                    .bind(i64::from(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM jobs ORDER BY created_at DESC LIMIT ?")
                    .bind(i64::from(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(Job::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    spec: String,
    status: String,
    total_files: i64,
    processed_files: i64,
    successful_transformations: i64,
    failed_transformations: i64,
    error: Option<String>,
    created_at: String,
    updated_at: String,
}

fn counter(value: i64, column: &str) -> DomainResult<u32> {
    u32::try_from(value)
        .map_err(|_| DomainError::SerializationError(format!("Invalid {column}: {value}")))
}

impl TryFrom<JobRow> for Job {
    type Error = DomainError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let spec: JobSpec = serde_json::from_str(&row.spec)?;
        let status = JobStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid status: {}", row.status)))?;

        Ok(Job {
            id: parse_uuid(&row.id)?,
            spec,
            status,
            total_files: counter(row.total_files, "total_files")?,
            processed_files: counter(row.processed_files, "processed_files")?,
            successful_transformations: counter(row.successful_transformations, "successful_transformations")?,
            failed_transformations: counter(row.failed_transformations, "failed_transformations")?,
            error: row.error,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::JobRequest;

    async fn setup_test_repo() -> SqliteJobRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteJobRepository::new(pool)
    }

    fn sample_job() -> Job {
        let spec = JobRequest::new("repo-1", "/tmp/repo", "optimize").validate().unwrap();
        Job::new(spec)
    }

    #[tokio::test]
    async fn test_create_and_get_job() {
        let repo = setup_test_repo().await;
        let job = sample_job();

        repo.create(&job).await.unwrap();

        let retrieved = repo.get(job.id).await.unwrap().unwrap();
        assert_eq!(retrieved.id, job.id);
        assert_eq!(retrieved.status, JobStatus::Pending);
        assert_eq!(retrieved.spec, job.spec);
    }

    #[tokio::test]
    async fn test_get_missing_job_returns_none() {
        let repo = setup_test_repo().await;
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_status_follows_transitions() {
        let repo = setup_test_repo().await;
        let job = sample_job();
        repo.create(&job).await.unwrap();

        assert!(repo.update_status(job.id, JobStatus::Running, None).await.unwrap());
        assert!(repo.update_status(job.id, JobStatus::Completed, None).await.unwrap());

        // Terminal status is sticky
        assert!(!repo.update_status(job.id, JobStatus::Cancelled, None).await.unwrap());
        assert!(!repo.update_status(job.id, JobStatus::Failed, Some("late")).await.unwrap());

        let stored = repo.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert!(stored.error.is_none());
    }

    #[tokio::test]
    async fn test_update_status_records_error() {
        let repo = setup_test_repo().await;
        let job = sample_job();
        repo.create(&job).await.unwrap();

        repo.update_status(job.id, JobStatus::Running, None).await.unwrap();
        repo.update_status(job.id, JobStatus::Failed, Some("No files found for transformation"))
            .await
            .unwrap();

        let stored = repo.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error.as_deref(), Some("No files found for transformation"));
    }

    #[tokio::test]
    async fn test_progress_does_not_touch_status() {
        let repo = setup_test_repo().await;
        let job = sample_job();
        repo.create(&job).await.unwrap();
        repo.update_status(job.id, JobStatus::Running, None).await.unwrap();
        repo.update_status(job.id, JobStatus::Cancelled, None).await.unwrap();

        repo.set_total_files(job.id, 12).await.unwrap();
        repo.record_progress(job.id, BatchTally { processed: 5, successful: 4, failed: 1 }).await.unwrap();
        repo.record_progress(job.id, BatchTally { processed: 5, successful: 5, failed: 0 }).await.unwrap();

        let stored = repo.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Cancelled);
        assert_eq!(stored.total_files, 12);
        assert_eq!(stored.processed_files, 10);
        assert_eq!(stored.successful_transformations, 9);
        assert_eq!(stored.failed_transformations, 1);
    }

    #[tokio::test]
    async fn test_progress_on_missing_job_fails() {
        let repo = setup_test_repo().await;
        let err = repo.record_progress(Uuid::new_v4(), BatchTally::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let repo = setup_test_repo().await;
        let first = sample_job();
        let second = sample_job();
        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();
        repo.update_status(second.id, JobStatus::Running, None).await.unwrap();

        assert_eq!(repo.list(None, 10).await.unwrap().len(), 2);
        let running = repo.list(Some(JobStatus::Running), 10).await.unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].id, second.id);
    }
}
