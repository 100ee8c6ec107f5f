//! Local directory working copies.
//!
//! Each job gets its own copy of the repository under
//! `<root>/<repo_id>_<job_id>` so concurrent jobs never touch the same files.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Job;
use crate::domain::ports::Workspace;

/// Directories never copied into a working copy.
const EXCLUDED_DIRS: &[&str] = &[".git"];

/// Workspace that copies a local checkout into a per-job directory.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a job's working copy lives in.
    pub fn job_dir(&self, job: &Job) -> PathBuf {
        self.root.join(format!("{}_{}", sanitize(&job.spec.repo_id), job.id))
    }
}

fn sanitize(repo_id: &str) -> String {
    repo_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn copy_tree(source: &Path, target: &Path) -> DomainResult<u64> {
    let mut copied = 0;
    let walker = WalkDir::new(source).into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !(entry.file_type().is_dir()
                && EXCLUDED_DIRS.iter().any(|d| entry.file_name() == *d))
    });

    for entry in walker {
        let entry = entry.map_err(|e| DomainError::WorkspaceError(format!("Failed to walk repository: {e}")))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| DomainError::WorkspaceError(e.to_string()))?;
        let dest = target.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &dest)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[async_trait]
impl Workspace for LocalWorkspace {
    #[instrument(skip(self, job), fields(job_id = %job.id, repo = %job.spec.repo_url))]
    async fn prepare(&self, job: &Job) -> DomainResult<PathBuf> {
        let source = PathBuf::from(&job.spec.repo_url);
        if !source.is_dir() {
            return Err(DomainError::WorkspaceError(format!(
                "Repository path does not exist or is not a directory: {}",
                source.display()
            )));
        }

        let target = self.job_dir(job);
        if target.exists() {
            debug!(path = %target.display(), "removing stale working copy");
            tokio::fs::remove_dir_all(&target).await?;
        }
        tokio::fs::create_dir_all(&target).await?;

        let copy_target = target.clone();
        let copied = tokio::task::spawn_blocking(move || copy_tree(&source, &copy_target))
            .await
            .map_err(|e| DomainError::WorkspaceError(format!("Copy task failed: {e}")))??;

        info!(path = %target.display(), files = copied, "working copy prepared");
        Ok(target)
    }
}
