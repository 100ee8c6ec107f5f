use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::TransformationOutcome;

/// Append-only log of per-file outcomes, keyed by job.
#[async_trait]
pub trait OutcomeRepository: Send + Sync {
    /// Append outcomes in the given order
    async fn append(&self, outcomes: &[TransformationOutcome]) -> DomainResult<()>;

    /// Page through a job's outcomes in insertion order
    async fn list(&self, job_id: Uuid, limit: u32, offset: u32) -> DomainResult<Vec<TransformationOutcome>>;

    /// Count all outcomes stored for a job
    async fn count(&self, job_id: Uuid) -> DomainResult<u64>;
}
