//! SQLite implementation of the append-only OutcomeRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_datetime, parse_optional_json, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ComplexityReport, TransformationOutcome, VerificationResult};
use crate::domain::ports::OutcomeRepository;

#[derive(Clone)]
pub struct SqliteOutcomeRepository {
    pool: SqlitePool,
}

impl SqliteOutcomeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutcomeRepository for SqliteOutcomeRepository {
    async fn append(&self, outcomes: &[TransformationOutcome]) -> DomainResult<()> {
        if outcomes.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for outcome in outcomes {
            let verification_json = serde_json::to_string(&outcome.verification)?;
            let complexity_json = outcome.complexity.as_ref().map(serde_json::to_string).transpose()?;

            sqlx::query(
                r#"INSERT INTO transformation_outcomes (id, job_id, file_path, language, model,
                   applied, summary, verification, complexity, error, duration_ms, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(outcome.id.to_string())
            .bind(outcome.job_id.to_string())
            .bind(&outcome.file_path)
            .bind(&outcome.language)
            .bind(&outcome.model)
            .bind(outcome.applied)
            .bind(&outcome.summary)
            .bind(&verification_json)
            .bind(&complexity_json)
            .bind(&outcome.error)
            .bind(i64::try_from(outcome.duration_ms).unwrap_or(i64::MAX))
            .bind(outcome.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn list(&self, job_id: Uuid, limit: u32, offset: u32) -> DomainResult<Vec<TransformationOutcome>> {
        let rows: Vec<OutcomeRow> = sqlx::query_as(
            r#"SELECT id, job_id, file_path, language, model, applied, summary, verification,
               complexity, error, duration_ms, created_at
               FROM transformation_outcomes WHERE job_id = ? ORDER BY seq ASC LIMIT ? OFFSET ?"#,
        )
        .bind(job_id.to_string())
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransformationOutcome::try_from).collect()
    }

    async fn count(&self, job_id: Uuid) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transformation_outcomes WHERE job_id = ?")
            .bind(job_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count).map_err(|_| DomainError::SerializationError(format!("Invalid count: {count}")))
    }
}

#[derive(sqlx::FromRow)]
struct OutcomeRow {
    id: String,
    job_id: String,
    file_path: String,
    language: Option<String>,
    model: Option<String>,
    applied: bool,
    summary: String,
    verification: String,
    complexity: Option<String>,
    error: Option<String>,
    duration_ms: i64,
    created_at: String,
}

impl TryFrom<OutcomeRow> for TransformationOutcome {
    type Error = DomainError;

    fn try_from(row: OutcomeRow) -> Result<Self, Self::Error> {
        let verification: VerificationResult = serde_json::from_str(&row.verification)?;
        let complexity: Option<ComplexityReport> = parse_optional_json(row.complexity)?;

        Ok(TransformationOutcome {
            id: parse_uuid(&row.id)?,
            job_id: parse_uuid(&row.job_id)?,
            file_path: row.file_path,
            language: row.language,
            model: row.model,
            applied: row.applied,
            summary: row.summary,
            verification,
            complexity,
            error: row.error,
            duration_ms: u64::try_from(row.duration_ms).unwrap_or_default(),
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteJobRepository};
    use crate::domain::models::{
        CheckKind, CheckResult, FileTask, Job, JobRequest, VerificationLevel,
    };
    use crate::domain::ports::JobRepository;

    async fn setup() -> (SqliteOutcomeRepository, Uuid) {
        let pool = create_migrated_test_pool().await.unwrap();
        let jobs = SqliteJobRepository::new(pool.clone());
        let job = Job::new(JobRequest::new("repo", "/tmp/repo", "prune").validate().unwrap());
        jobs.create(&job).await.unwrap();
        (SqliteOutcomeRepository::new(pool), job.id)
    }

    fn outcome(job_id: Uuid, path: &str) -> TransformationOutcome {
        let mut verification = VerificationResult::new(VerificationLevel::Basic);
        verification.push(CheckResult::pass(CheckKind::Syntax));
        TransformationOutcome {
            applied: true,
            summary: format!("pruned {path}"),
            verification,
            model: Some("codellama".into()),
            error: None,
            ..TransformationOutcome::failed(job_id, &FileTask::new(path, 10), VerificationLevel::Basic, "x")
        }
    }

    #[tokio::test]
    async fn test_append_and_page_in_insertion_order() {
        let (repo, job_id) = setup().await;
        let batch: Vec<_> = ["c.py", "a.py", "b.py"].iter().map(|p| outcome(job_id, p)).collect();
        repo.append(&batch).await.unwrap();
        repo.append(&[outcome(job_id, "d.py")]).await.unwrap();

        assert_eq!(repo.count(job_id).await.unwrap(), 4);

        let first_page = repo.list(job_id, 2, 0).await.unwrap();
        let paths: Vec<_> = first_page.iter().map(|o| o.file_path.as_str()).collect();
        assert_eq!(paths, vec!["c.py", "a.py"]);

        let second_page = repo.list(job_id, 2, 2).await.unwrap();
        let paths: Vec<_> = second_page.iter().map(|o| o.file_path.as_str()).collect();
        assert_eq!(paths, vec!["b.py", "d.py"]);
    }

    #[tokio::test]
    async fn test_round_trips_nested_verification() {
        let (repo, job_id) = setup().await;
        let original = outcome(job_id, "x.py");
        repo.append(std::slice::from_ref(&original)).await.unwrap();

        let stored = repo.list(job_id, 10, 0).await.unwrap().remove(0);
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.verification, original.verification);
        assert!(stored.is_success());
        assert_eq!(stored.model.as_deref(), Some("codellama"));
    }

    #[tokio::test]
    async fn test_unknown_job_has_no_outcomes() {
        let (repo, _) = setup().await;
        assert_eq!(repo.count(Uuid::new_v4()).await.unwrap(), 0);
        assert!(repo.list(Uuid::new_v4(), 10, 0).await.unwrap().is_empty());
    }
}
