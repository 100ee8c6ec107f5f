//! Resolution of a job's target file set.
//!
//! Sources, in order of preference:
//! 1. the job's explicit file list;
//! 2. the candidate selector's prioritized list;
//! 3. a scan of the working copy, used when the selector fails or returns nothing.
//!
//! Every source goes through the same containment, existence, size and
//! language filters. Paths that would resolve outside the working copy are
//! dropped with a warning.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{detect_language, is_confined_path, FileTask, JobSpec};
use crate::domain::ports::{Candidate, CandidateQuery, CandidateSelector};

/// Multiplier applied to the batch size to bound the selector's result count.
const CANDIDATE_LIMIT_FACTOR: u32 = 10;

pub struct FileResolver {
    selector: Arc<dyn CandidateSelector>,
}

impl FileResolver {
    pub fn new(selector: Arc<dyn CandidateSelector>) -> Self {
        Self { selector }
    }

    pub async fn resolve(&self, spec: &JobSpec, root: &Path) -> DomainResult<Vec<FileTask>> {
        if let Some(paths) = &spec.file_paths {
            let paths = paths.clone();
            return on_blocking(spec, root, move |spec, root| explicit_files(spec, root, &paths)).await;
        }

        match self.candidates(spec, root).await {
            Ok(tasks) if !tasks.is_empty() => return Ok(tasks),
            Ok(_) => info!("candidate selector returned no usable files, scanning working copy"),
            Err(e) => warn!(error = %e, "candidate selector failed, scanning working copy"),
        }

        on_blocking(spec, root, scan_directory).await
    }

    async fn candidates(&self, spec: &JobSpec, root: &Path) -> DomainResult<Vec<FileTask>> {
        let language = match spec.languages.as_deref() {
            Some([only]) => Some(only.clone()),
            _ => None,
        };
        let query = CandidateQuery {
            repo_id: spec.repo_id.clone(),
            kind: spec.kind,
            language,
            limit: spec.batch_size.saturating_mul(CANDIDATE_LIMIT_FACTOR),
        };

        let candidates = self.selector.list_candidates(&query).await?;
        debug!(count = candidates.len(), "received transformation candidates");

        let mut tasks = on_blocking(spec, root, move |spec, root| {
            candidates
                .into_iter()
                .filter_map(|candidate| candidate_task(spec, root, candidate))
                .collect::<Vec<_>>()
        })
        .await?;
        // Stable, so equal priorities keep the selector's order.
        tasks.sort_by(|a, b| {
            b.priority
                .unwrap_or(0.0)
                .partial_cmp(&a.priority.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal)
        });
        Ok(tasks)
    }
}

/// Run filesystem filtering off the async runtime.
async fn on_blocking<T, F>(spec: &JobSpec, root: &Path, f: F) -> DomainResult<T>
where
    T: Send + 'static,
    F: FnOnce(&JobSpec, &Path) -> T + Send + 'static,
{
    let spec = spec.clone();
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || f(&spec, &root))
        .await
        .map_err(|e| DomainError::WorkspaceError(format!("File resolution failed: {e}")))
}

/// Size of a regular file under `root`, or `None` if it is missing or not a file.
///
/// Paths that would leave the working copy are refused before touching disk.
fn file_size(root: &Path, relative: &str) -> Option<u64> {
    if !is_confined_path(relative) {
        warn!(file = %relative, "path escapes the working copy, skipping");
        return None;
    }
    std::fs::symlink_metadata(root.join(relative))
        .ok()
        .filter(std::fs::Metadata::is_file)
        .map(|m| m.len())
}

fn admit(spec: &JobSpec, task: &FileTask) -> bool {
    task.size_bytes <= spec.max_file_size_bytes() && spec.allows_language(task.language.as_deref())
}

fn explicit_files(spec: &JobSpec, root: &Path, paths: &[String]) -> Vec<FileTask> {
    paths
        .iter()
        .filter_map(|path| match file_size(root, path) {
            Some(size) => Some(FileTask::new(path.clone(), size)),
            None => {
                warn!(file = %path, "requested file is not a file in the working copy, skipping");
                None
            }
        })
        .filter(|task| admit(spec, task))
        .collect()
}

fn candidate_task(spec: &JobSpec, root: &Path, candidate: Candidate) -> Option<FileTask> {
    let size = file_size(root, &candidate.file_path)?;
    let mut task = FileTask::new(candidate.file_path, size);
    if let Some(language) = candidate.language.filter(|l| !l.is_empty()) {
        task.language = Some(language.to_lowercase());
    }
    task.priority = candidate.priority;
    task.metrics = candidate.metrics;
    admit(spec, &task).then_some(task)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Walk the working copy, skipping hidden entries, in traversal order.
fn scan_directory(spec: &JobSpec, root: &Path) -> Vec<FileTask> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?.to_string_lossy().into_owned();
            if detect_language(&relative).is_none() || !is_confined_path(&relative) {
                return None;
            }
            let size = entry.metadata().ok()?.len();
            Some(FileTask::new(relative, size))
        })
        .filter(|task| admit(spec, task))
        .collect()
}
