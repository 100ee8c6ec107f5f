//! Common test utilities for integration tests
//!
//! Builds a fully wired orchestrator over an in-memory SQLite pool and
//! scratch directories, with every collaborator replaceable.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use reforge::adapters::ai::MockAiBackend;
use reforge::adapters::memory::{InMemoryCancellationSignal, InMemoryMetrics, NullCandidateSelector, NullPatternRepository};
use reforge::adapters::sqlite::{create_migrated_test_pool, SqliteJobRepository, SqliteOutcomeRepository};
use reforge::adapters::verifier::{CommandSyntaxChecker, DetectingTestRunner, NonEmptyCandidateCheck};
use reforge::adapters::LocalWorkspace;
use reforge::domain::models::Job;
use reforge::domain::ports::{
    AdditionalCheck, AiBackend, CandidateSelector, PatternRepository, SyntaxChecker, TestRunner, Verdict,
    VerificationContext,
};
use reforge::services::{
    BatchCoordinator, FileResolver, JobOrchestrator, OrchestratorParts, OrchestratorSettings, TransformationWorker,
    VerificationPipeline, WorkerSettings,
};

/// Reply that rewrites any file to `y = 0`.
pub const REWRITE_REPLY: &str = "SUMMARY: simplified assignment\n```python\ny = 0\n```";

/// Verifier backend returning a fixed verdict and counting calls.
pub struct StubCheck {
    verdict: Verdict,
    calls: AtomicUsize,
}

impl StubCheck {
    pub fn new(verdict: Verdict) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn pass() -> Arc<Self> {
        Self::new(Verdict::Pass)
    }

    pub fn fail(message: &str) -> Arc<Self> {
        Self::new(Verdict::Fail(message.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> Verdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone()
    }
}

#[async_trait]
impl SyntaxChecker for StubCheck {
    async fn check_syntax(&self, _ctx: &VerificationContext) -> Verdict {
        self.record()
    }
}

#[async_trait]
impl AdditionalCheck for StubCheck {
    async fn check(&self, _ctx: &VerificationContext) -> Verdict {
        self.record()
    }
}

#[async_trait]
impl TestRunner for StubCheck {
    async fn run_tests(&self, _ctx: &VerificationContext) -> Verdict {
        self.record()
    }
}

/// Wired orchestrator plus the handles tests inspect.
pub struct Harness {
    pub orchestrator: Arc<JobOrchestrator>,
    pub metrics: Arc<InMemoryMetrics>,
    pub workspaces: TempDir,
}

impl Harness {
    /// Working copy of a job run by this harness.
    pub fn working_copy(&self, job: &Job) -> PathBuf {
        LocalWorkspace::new(self.workspaces.path()).job_dir(job)
    }
}

pub struct HarnessBuilder {
    ai: Arc<dyn AiBackend>,
    selector: Arc<dyn CandidateSelector>,
    patterns: Arc<dyn PatternRepository>,
    syntax: Arc<dyn SyntaxChecker>,
    additional: Arc<dyn AdditionalCheck>,
    tests: Arc<dyn TestRunner>,
    require_tests: bool,
    max_concurrency: usize,
    settings: OrchestratorSettings,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            ai: Arc::new(MockAiBackend::with_reply(REWRITE_REPLY)),
            selector: Arc::new(NullCandidateSelector),
            patterns: Arc::new(NullPatternRepository),
            syntax: Arc::new(CommandSyntaxChecker::new(BTreeMap::new(), Duration::from_secs(5))),
            additional: Arc::new(NonEmptyCandidateCheck),
            tests: Arc::new(DetectingTestRunner::new(Duration::from_secs(5))),
            require_tests: false,
            max_concurrency: 5,
            settings: OrchestratorSettings::default(),
        }
    }
}

impl HarnessBuilder {
    pub fn ai(mut self, ai: Arc<dyn AiBackend>) -> Self {
        self.ai = ai;
        self
    }

    pub fn selector(mut self, selector: Arc<dyn CandidateSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn patterns(mut self, patterns: Arc<dyn PatternRepository>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn syntax(mut self, syntax: Arc<dyn SyntaxChecker>) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn additional(mut self, additional: Arc<dyn AdditionalCheck>) -> Self {
        self.additional = additional;
        self
    }

    pub fn tests(mut self, tests: Arc<dyn TestRunner>, require_tests: bool) -> Self {
        self.tests = tests;
        self.require_tests = require_tests;
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub async fn build(self) -> Harness {
        let pool = create_migrated_test_pool().await.expect("Failed to create test pool");
        let metrics = Arc::new(InMemoryMetrics::new());
        let workspaces = temp_dir();

        let verifier = Arc::new(VerificationPipeline::new(
            self.syntax,
            self.additional,
            self.tests,
            metrics.clone(),
            self.require_tests,
        ));
        let worker = TransformationWorker::new(
            self.ai,
            self.patterns,
            verifier,
            metrics.clone(),
            WorkerSettings::default(),
        );
        let parts = OrchestratorParts {
            jobs: Arc::new(SqliteJobRepository::new(pool.clone())),
            outcomes: Arc::new(SqliteOutcomeRepository::new(pool)),
            cancellation: Arc::new(InMemoryCancellationSignal::new()),
            workspace: Arc::new(LocalWorkspace::new(workspaces.path())),
            resolver: FileResolver::new(self.selector),
            coordinator: BatchCoordinator::new(Arc::new(worker), self.max_concurrency),
            metrics: metrics.clone(),
        };

        Harness {
            orchestrator: Arc::new(JobOrchestrator::new(parts, self.settings)),
            metrics,
            workspaces,
        }
    }
}

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Repository with `count` python files `mod_00.py`, `mod_01.py`, ...
pub fn python_repo(count: usize) -> TempDir {
    let dir = temp_dir();
    for i in 0..count {
        write_file(dir.path(), &format!("mod_{i:02}.py"), &format!("x = {i}\n"));
    }
    dir
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(path, contents).expect("Failed to write file");
}

pub fn repo_url(dir: &TempDir) -> String {
    dir.path().to_string_lossy().into_owned()
}
