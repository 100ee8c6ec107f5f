use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{BatchTally, Job, JobStatus};

/// Repository port for the job registry.
///
/// Writes are field-level so that progress updates and status changes made
/// by different callers never overwrite each other.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job
    async fn create(&self, job: &Job) -> DomainResult<()>;

    /// Get a job by ID
    async fn get(&self, id: Uuid) -> DomainResult<Option<Job>>;

    /// Move a job to `status` if its current status allows the transition.
    ///
    /// Returns `false` when the stored status did not permit it (for example
    /// the job already reached a terminal state), in which case nothing changes.
    async fn update_status(&self, id: Uuid, status: JobStatus, error: Option<&str>) -> DomainResult<bool>;

    /// Record the size of the resolved file set
    async fn set_total_files(&self, id: Uuid, total: u32) -> DomainResult<()>;

    /// Add one batch's counts to the progress counters
    async fn record_progress(&self, id: Uuid, tally: BatchTally) -> DomainResult<()>;

    /// List jobs, newest first
    async fn list(&self, status: Option<JobStatus>, limit: u32) -> DomainResult<Vec<Job>>;
}
