//! Job lifecycle and batch-by-batch execution.
//!
//! The orchestrator owns every status write for a job. Workers only return
//! outcomes; the orchestrator appends them to the outcome log and advances
//! the job's counters after each batch. Cancellation is cooperative and is
//! observed between batches.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::batch_coordinator::BatchCoordinator;
use super::file_resolver::FileResolver;
use super::model_selection::ModelSelector;
use super::transformation_worker::JobContext;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AiConfig, BatchTally, FileTask, Job, JobRequest, JobResults, JobStatus, TransformationKind, VerificationLevel,
};
use crate::domain::ports::metrics::JOBS_TOTAL;
use crate::domain::ports::{CancellationSignal, JobRepository, MetricsSink, OutcomeRepository, Workspace};

pub const NO_FILES_FOUND: &str = "No files found for transformation";

/// Collaborators the orchestrator drives.
pub struct OrchestratorParts {
    pub jobs: Arc<dyn JobRepository>,
    pub outcomes: Arc<dyn OutcomeRepository>,
    pub cancellation: Arc<dyn CancellationSignal>,
    pub workspace: Arc<dyn Workspace>,
    pub resolver: FileResolver,
    pub coordinator: BatchCoordinator,
    pub metrics: Arc<dyn MetricsSink>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Default model names; jobs may override them.
    pub ai: AiConfig,
    /// How long a raised cancel signal stays valid.
    pub cancel_ttl: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            cancel_ttl: Duration::from_secs(3600),
        }
    }
}

pub struct JobOrchestrator {
    jobs: Arc<dyn JobRepository>,
    outcomes: Arc<dyn OutcomeRepository>,
    cancellation: Arc<dyn CancellationSignal>,
    workspace: Arc<dyn Workspace>,
    resolver: FileResolver,
    coordinator: BatchCoordinator,
    metrics: Arc<dyn MetricsSink>,
    settings: OrchestratorSettings,
    /// Jobs spawned by `submit` in this process.
    running: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl JobOrchestrator {
    pub fn new(parts: OrchestratorParts, settings: OrchestratorSettings) -> Self {
        Self {
            jobs: parts.jobs,
            outcomes: parts.outcomes,
            cancellation: parts.cancellation,
            workspace: parts.workspace,
            resolver: parts.resolver,
            coordinator: parts.coordinator,
            metrics: parts.metrics,
            settings,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Validate and persist a new `pending` job without starting it.
    pub async fn create(&self, request: JobRequest) -> DomainResult<Job> {
        let job = Job::new(request.validate()?);
        self.jobs.create(&job).await?;
        info!(job_id = %job.id, kind = %job.spec.kind, level = %job.spec.verification_level, "job created");
        Ok(job)
    }

    /// Create a job and start it in the background; returns immediately.
    pub async fn submit(self: &Arc<Self>, request: JobRequest) -> DomainResult<Uuid> {
        let job = self.create(request).await?;
        let job_id = job.id;

        let this = Arc::clone(self);
        let handle = tokio::spawn(
            async move {
                if let Err(e) = this.run(job_id).await {
                    error!(error = %e, "job execution failed");
                }
            }
            .instrument(info_span!("job", %job_id)),
        );
        self.running.lock().await.insert(job_id, handle);

        Ok(job_id)
    }

    /// Wait for a job started by `submit` to finish, then return its final state.
    pub async fn wait(&self, job_id: Uuid) -> DomainResult<Job> {
        let handle = self.running.lock().await.remove(&job_id);
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| DomainError::ExecutionFailed(format!("Job task failed: {e}")))?;
        }
        self.get_status(job_id).await
    }

    pub async fn get_status(&self, job_id: Uuid) -> DomainResult<Job> {
        self.jobs.get(job_id).await?.ok_or(DomainError::JobNotFound(job_id))
    }

    pub async fn get_results(&self, job_id: Uuid, limit: u32, offset: u32) -> DomainResult<JobResults> {
        let job = self.get_status(job_id).await?;
        let outcomes = self.outcomes.list(job_id, limit, offset).await?;
        let total = self.outcomes.count(job_id).await?;
        Ok(JobResults { job, outcomes, total })
    }

    pub async fn list_jobs(&self, status: Option<JobStatus>, limit: u32) -> DomainResult<Vec<Job>> {
        self.jobs.list(status, limit).await
    }

    /// Mark a job cancelled and raise its cancel signal.
    ///
    /// A running job stops at its next batch boundary; the batch in flight
    /// completes and its outcomes are kept.
    pub async fn cancel(&self, job_id: Uuid) -> DomainResult<Job> {
        let job = self.get_status(job_id).await?;
        if job.is_terminal() {
            return Err(DomainError::AlreadyTerminal {
                id: job_id,
                status: job.status,
            });
        }

        if !self.jobs.update_status(job_id, JobStatus::Cancelled, None).await? {
            // Lost the race against a terminal write.
            let current = self.get_status(job_id).await?;
            return Err(DomainError::AlreadyTerminal {
                id: job_id,
                status: current.status,
            });
        }

        // A pending job never starts once its status is cancelled; only a
        // running loop needs the out-of-band signal.
        if job.status == JobStatus::Running {
            self.cancellation.raise(job_id, self.settings.cancel_ttl).await?;
        }
        info!(%job_id, was = %job.status, "job cancelled");
        self.get_status(job_id).await
    }

    pub fn transformation_kinds(&self) -> &'static [TransformationKind] {
        &TransformationKind::ALL
    }

    pub fn verification_levels(&self) -> &'static [VerificationLevel] {
        &VerificationLevel::ALL
    }

    /// Execute a created job on the calling task and return its final status.
    pub async fn run(&self, job_id: Uuid) -> DomainResult<JobStatus> {
        let job = self.get_status(job_id).await?;

        if self.jobs.update_status(job_id, JobStatus::Running, None).await? {
            info!(%job_id, repo = %job.spec.repo_id, "job started");
            if let Err(e) = self.execute(&job).await {
                error!(%job_id, error = %e, "job failed");
                let message = match &e {
                    DomainError::ExecutionFailed(message) => message.clone(),
                    other => other.to_string(),
                };
                self.jobs.update_status(job_id, JobStatus::Failed, Some(&message)).await?;
            }
        } else {
            warn!(%job_id, status = %job.status, "job is not pending, not starting it");
        }

        if let Err(e) = self.cancellation.clear(job_id).await {
            warn!(%job_id, error = %e, "failed to clear cancel signal");
        }

        let status = self.get_status(job_id).await?.status;
        self.metrics.increment_counter(JOBS_TOTAL, &[("status", status.as_str())], 1);
        info!(%job_id, %status, "job finished");
        Ok(status)
    }

    async fn execute(&self, job: &Job) -> DomainResult<()> {
        let job_id = job.id;
        let root = self.workspace.prepare(job).await?;

        let tasks = self.resolver.resolve(&job.spec, &root).await?;
        if tasks.is_empty() {
            return Err(DomainError::ExecutionFailed(NO_FILES_FOUND.to_string()));
        }

        let total = u32::try_from(tasks.len())
            .map_err(|_| DomainError::ValidationFailed(format!("Too many files: {}", tasks.len())))?;
        self.jobs.set_total_files(job_id, total).await?;

        let ctx = Arc::new(self.job_context(job, &root));
        let batch_size = usize::try_from(job.spec.batch_size).unwrap_or(1).max(1);
        let batch_count = tasks.len().div_ceil(batch_size);
        info!(%job_id, files = total, batches = batch_count, "resolved target files");

        for (index, batch) in tasks.chunks(batch_size).enumerate() {
            if self.cancel_requested(job_id).await? {
                return self.stop_cancelled(job_id, index).await;
            }
            self.run_batch(&ctx, batch).await?;
            info!(%job_id, batch = index + 1, of = batch_count, "batch complete");
        }

        if self.cancel_requested(job_id).await? {
            return self.stop_cancelled(job_id, batch_count).await;
        }

        if !self.jobs.update_status(job_id, JobStatus::Completed, None).await? {
            warn!(%job_id, "job reached a terminal status before completion was recorded");
        }
        Ok(())
    }

    async fn run_batch(&self, ctx: &Arc<JobContext>, batch: &[FileTask]) -> DomainResult<()> {
        let outcomes = self.coordinator.run(Arc::clone(ctx), batch.to_vec()).await;
        self.outcomes.append(&outcomes).await?;

        let mut tally = BatchTally::default();
        for outcome in &outcomes {
            tally.record(outcome.is_success());
        }
        self.jobs.record_progress(ctx.job_id, tally).await
    }

    fn job_context(&self, job: &Job, root: &Path) -> JobContext {
        JobContext {
            job_id: job.id,
            workspace_root: root.to_path_buf(),
            kind: job.spec.kind,
            verification_level: job.spec.verification_level,
            safe_mode: job.spec.safe_mode,
            models: ModelSelector::from_config(&self.settings.ai, &job.spec.models),
        }
    }

    /// True when the signal is raised or the stored status was already set to cancelled.
    async fn cancel_requested(&self, job_id: Uuid) -> DomainResult<bool> {
        if self.cancellation.is_raised(job_id).await? {
            return Ok(true);
        }
        Ok(self.get_status(job_id).await?.status == JobStatus::Cancelled)
    }

    async fn stop_cancelled(&self, job_id: Uuid, batches_done: usize) -> DomainResult<()> {
        self.jobs.update_status(job_id, JobStatus::Cancelled, None).await?;
        info!(%job_id, batches_done, "job stopped on cancel request");
        Ok(())
    }
}
