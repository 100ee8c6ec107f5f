use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::errors::DomainResult;
use crate::domain::models::Job;

/// Provides an isolated working copy of a job's repository.
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Create the working copy and return its root
    async fn prepare(&self, job: &Job) -> DomainResult<PathBuf>;
}
