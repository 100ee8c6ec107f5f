//! Concurrent execution of one batch of file tasks.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, instrument};

use super::transformation_worker::{JobContext, TransformationWorker};
use crate::domain::models::{FileTask, TransformationOutcome};

pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Runs a batch through the worker with at most `max_concurrency` files in flight.
///
/// Every input task yields exactly one outcome. A worker task that panics or
/// is aborted is reported as a failed outcome for its file.
pub struct BatchCoordinator {
    worker: Arc<TransformationWorker>,
    max_concurrency: usize,
}

impl BatchCoordinator {
    pub fn new(worker: Arc<TransformationWorker>, max_concurrency: usize) -> Self {
        Self {
            worker,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    #[instrument(skip(self, ctx, tasks), fields(job_id = %ctx.job_id, files = tasks.len()))]
    pub async fn run(&self, ctx: Arc<JobContext>, tasks: Vec<FileTask>) -> Vec<TransformationOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let handles = tasks.iter().cloned().map(|task| {
            let worker = Arc::clone(&self.worker);
            let ctx = Arc::clone(&ctx);
            let semaphore = Arc::clone(&semaphore);
            tokio::spawn(async move {
                // The semaphore is never closed, so acquisition only fails if that changes.
                let _permit = semaphore.acquire_owned().await;
                worker.process(&ctx, &task).await
            })
        });
        let results = join_all(handles.collect::<Vec<_>>()).await;

        results
            .into_iter()
            .zip(tasks.iter())
            .map(|(result, task)| {
                result.unwrap_or_else(|e| {
                    error!(file = %task.path, error = %e, "worker task did not complete");
                    TransformationOutcome::failed(
                        ctx.job_id,
                        task,
                        ctx.verification_level,
                        format!("Worker task failed: {e}"),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiBackend;
    use crate::adapters::memory::{InMemoryMetrics, NullPatternRepository};
    use crate::adapters::verifier::NonEmptyCandidateCheck;
    use crate::domain::models::{TransformationKind, VerificationLevel};
    use crate::domain::ports::{SyntaxChecker, TestRunner, Verdict, VerificationContext};
    use crate::services::model_selection::ModelSelector;
    use crate::services::transformation_worker::WorkerSettings;
    use crate::services::verification_pipeline::VerificationPipeline;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    struct AlwaysPass;

    #[async_trait]
    impl SyntaxChecker for AlwaysPass {
        async fn check_syntax(&self, _ctx: &VerificationContext) -> Verdict {
            Verdict::Pass
        }
    }

    #[async_trait]
    impl TestRunner for AlwaysPass {
        async fn run_tests(&self, _ctx: &VerificationContext) -> Verdict {
            Verdict::Pass
        }
    }

    fn coordinator(ai: Arc<MockAiBackend>, max_concurrency: usize) -> BatchCoordinator {
        let metrics = Arc::new(InMemoryMetrics::new());
        let verifier = Arc::new(VerificationPipeline::new(
            Arc::new(AlwaysPass),
            Arc::new(NonEmptyCandidateCheck),
            Arc::new(AlwaysPass),
            metrics.clone(),
            false,
        ));
        let worker = TransformationWorker::new(
            ai,
            Arc::new(NullPatternRepository),
            verifier,
            metrics,
            WorkerSettings::default(),
        );
        BatchCoordinator::new(Arc::new(worker), max_concurrency)
    }

    fn job_context(root: &std::path::Path) -> Arc<JobContext> {
        Arc::new(JobContext {
            job_id: Uuid::new_v4(),
            workspace_root: root.to_path_buf(),
            kind: TransformationKind::Prune,
            verification_level: VerificationLevel::Standard,
            safe_mode: true,
            models: ModelSelector::new("p", "f", "s", 1000),
        })
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let dir = TempDir::new().unwrap();
        let tasks: Vec<_> = (0..12)
            .map(|i| {
                let name = format!("f{i}.py");
                std::fs::write(dir.path().join(&name), format!("x = {i}")).unwrap();
                FileTask::new(name, 5)
            })
            .collect();

        let ai = Arc::new(
            MockAiBackend::with_reply("SUMMARY: ok\n```python\ny = 1\n```").with_delay(Duration::from_millis(30)),
        );
        let outcomes = coordinator(ai.clone(), 3).run(job_context(dir.path()), tasks).await;

        assert_eq!(outcomes.len(), 12);
        assert!(outcomes.iter().all(TransformationOutcome::is_success));
        assert!(ai.max_in_flight() <= 3);
        assert!(ai.max_in_flight() >= 2);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ok.py"), "x = 0").unwrap();
        let tasks = vec![FileTask::new("ok.py", 5), FileTask::new("missing.py", 5)];

        let ai = Arc::new(MockAiBackend::with_reply("SUMMARY: ok\n```python\nx = 1\n```"));
        let outcomes = coordinator(ai, 5).run(job_context(dir.path()), tasks).await;

        assert_eq!(outcomes.len(), 2);
        let ok = outcomes.iter().find(|o| o.file_path == "ok.py").unwrap();
        let missing = outcomes.iter().find(|o| o.file_path == "missing.py").unwrap();
        assert!(ok.is_success());
        assert!(!missing.is_success());
    }

    #[tokio::test]
    async fn test_panicking_worker_yields_failed_outcome() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("boom.py"), "x = 0").unwrap();

        let ai = Arc::new(MockAiBackend::with_responder(|_, _| panic!("backend exploded")));
        let outcomes = coordinator(ai, 5)
            .run(job_context(dir.path()), vec![FileTask::new("boom.py", 5)])
            .await;

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].applied);
        assert!(outcomes[0].error.as_deref().unwrap().contains("Worker task failed"));
    }
}
