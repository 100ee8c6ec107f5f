//! Verification ladder run against every candidate rewrite.
//!
//! Stages run in order (syntax, additional checks, tests) up to the job's
//! verification level. The first failing stage ends the ladder.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::models::{CheckKind, CheckResult, VerificationLevel, VerificationResult};
use crate::domain::ports::metrics::{
    VERIFICATION_ATTEMPTS_TOTAL, VERIFICATION_SUCCESSES_TOTAL, VERIFICATION_SUCCESS_RATIO,
};
use crate::domain::ports::{AdditionalCheck, MetricsSink, SyntaxChecker, TestRunner, Verdict, VerificationContext};

pub const NO_TESTS_FOUND: &str = "no tests found";

pub struct VerificationPipeline {
    syntax: Arc<dyn SyntaxChecker>,
    additional: Arc<dyn AdditionalCheck>,
    tests: Arc<dyn TestRunner>,
    metrics: Arc<dyn MetricsSink>,
    /// Fail `strict` verification when no test command is detected.
    require_tests: bool,
    attempts: AtomicU64,
    successes: AtomicU64,
}

impl VerificationPipeline {
    pub fn new(
        syntax: Arc<dyn SyntaxChecker>,
        additional: Arc<dyn AdditionalCheck>,
        tests: Arc<dyn TestRunner>,
        metrics: Arc<dyn MetricsSink>,
        require_tests: bool,
    ) -> Self {
        Self {
            syntax,
            additional,
            tests,
            metrics,
            require_tests,
            attempts: AtomicU64::new(0),
            successes: AtomicU64::new(0),
        }
    }

    pub async fn verify(&self, level: VerificationLevel, ctx: &VerificationContext) -> VerificationResult {
        let result = self.run_ladder(level, ctx).await;
        if level != VerificationLevel::None {
            self.record(result.verified);
        }
        result
    }

    async fn run_ladder(&self, level: VerificationLevel, ctx: &VerificationContext) -> VerificationResult {
        let mut result = VerificationResult::new(level);

        if level.runs_syntax() {
            let check = lenient(CheckKind::Syntax, self.syntax.check_syntax(ctx).await);
            if !push_and_continue(&mut result, check, ctx) {
                return result;
            }
        }

        if level.runs_additional_checks() {
            let check = lenient(CheckKind::Additional, self.additional.check(ctx).await);
            if !push_and_continue(&mut result, check, ctx) {
                return result;
            }
        }

        if level.runs_tests() {
            let check = match self.tests.run_tests(ctx).await {
                Verdict::Undetermined(reason) if self.require_tests => CheckResult::fail(CheckKind::Tests, reason),
                verdict => lenient(CheckKind::Tests, verdict),
            };
            push_and_continue(&mut result, check, ctx);
        }

        result
    }

    fn record(&self, verified: bool) {
        let attempts = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        let successes = if verified {
            self.successes.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            self.successes.load(Ordering::Relaxed)
        };

        self.metrics.increment_counter(VERIFICATION_ATTEMPTS_TOTAL, &[], 1);
        if verified {
            self.metrics.increment_counter(VERIFICATION_SUCCESSES_TOTAL, &[], 1);
        }
        self.metrics
            .set_gauge(VERIFICATION_SUCCESS_RATIO, &[], successes as f64 / attempts as f64);
    }
}

/// Map a verdict to a check, treating an undetermined verdict as a pass with a note.
fn lenient(kind: CheckKind, verdict: Verdict) -> CheckResult {
    match verdict {
        Verdict::Pass => CheckResult::pass(kind),
        Verdict::Fail(error) => CheckResult::fail(kind, error),
        Verdict::Undetermined(note) => CheckResult::pass(kind).with_note(note),
    }
}

fn push_and_continue(result: &mut VerificationResult, check: CheckResult, ctx: &VerificationContext) -> bool {
    let passed = check.passed;
    if passed {
        debug!(file = %ctx.file_path, check = check.check.as_str(), "check passed");
    } else {
        info!(file = %ctx.file_path, check = check.check.as_str(), errors = ?check.errors, "check failed");
    }
    result.push(check);
    passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMetrics;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    /// Verdict stub counting its invocations.
    struct Stub {
        verdict: Verdict,
        calls: AtomicUsize,
    }

    impl Stub {
        fn new(verdict: Verdict) -> Arc<Self> {
            Arc::new(Self {
                verdict,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn answer(&self) -> Verdict {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verdict.clone()
        }
    }

    #[async_trait]
    impl SyntaxChecker for Stub {
        async fn check_syntax(&self, _ctx: &VerificationContext) -> Verdict {
            self.answer()
        }
    }

    #[async_trait]
    impl AdditionalCheck for Stub {
        async fn check(&self, _ctx: &VerificationContext) -> Verdict {
            self.answer()
        }
    }

    #[async_trait]
    impl TestRunner for Stub {
        async fn run_tests(&self, _ctx: &VerificationContext) -> Verdict {
            self.answer()
        }
    }

    fn ctx() -> VerificationContext {
        VerificationContext {
            workspace_root: PathBuf::from("/tmp"),
            file_path: "a.py".into(),
            language: Some("python".into()),
            original: "print(0)".into(),
            candidate: "print(1)".into(),
        }
    }

    struct Harness {
        pipeline: VerificationPipeline,
        syntax: Arc<Stub>,
        additional: Arc<Stub>,
        tests: Arc<Stub>,
        metrics: Arc<InMemoryMetrics>,
    }

    fn harness(syntax: Verdict, additional: Verdict, tests: Verdict, require_tests: bool) -> Harness {
        let syntax = Stub::new(syntax);
        let additional = Stub::new(additional);
        let tests = Stub::new(tests);
        let metrics = Arc::new(InMemoryMetrics::new());
        let pipeline = VerificationPipeline::new(
            syntax.clone(),
            additional.clone(),
            tests.clone(),
            metrics.clone(),
            require_tests,
        );
        Harness {
            pipeline,
            syntax,
            additional,
            tests,
            metrics,
        }
    }

    #[tokio::test]
    async fn test_none_runs_nothing() {
        let h = harness(Verdict::Fail("bad".into()), Verdict::Pass, Verdict::Pass, false);
        let result = h.pipeline.verify(VerificationLevel::None, &ctx()).await;
        assert!(result.verified);
        assert!(result.checks.is_empty());
        assert_eq!(h.syntax.calls(), 0);
        assert_eq!(h.metrics.counter_total(VERIFICATION_ATTEMPTS_TOTAL), 0);
    }

    #[tokio::test]
    async fn test_basic_runs_syntax_only() {
        let h = harness(Verdict::Pass, Verdict::Fail("x".into()), Verdict::Pass, false);
        let result = h.pipeline.verify(VerificationLevel::Basic, &ctx()).await;
        assert!(result.verified);
        assert_eq!(result.checks.len(), 1);
        assert_eq!(h.additional.calls(), 0);
    }

    #[tokio::test]
    async fn test_standard_syntax_failure_short_circuits() {
        let h = harness(Verdict::Fail("SyntaxError".into()), Verdict::Pass, Verdict::Pass, false);
        let result = h.pipeline.verify(VerificationLevel::Standard, &ctx()).await;

        assert!(!result.verified);
        assert_eq!(result.errors(), vec!["SyntaxError".to_string()]);
        assert_eq!(h.syntax.calls(), 1);
        assert_eq!(h.additional.calls(), 0);
        assert_eq!(h.tests.calls(), 0);
    }

    #[tokio::test]
    async fn test_strict_additional_failure_skips_tests() {
        let h = harness(Verdict::Pass, Verdict::Fail("empty".into()), Verdict::Pass, false);
        let result = h.pipeline.verify(VerificationLevel::Strict, &ctx()).await;
        assert!(!result.verified);
        assert_eq!(result.checks.len(), 2);
        assert_eq!(h.tests.calls(), 0);
    }

    #[tokio::test]
    async fn test_strict_without_tests_passes_with_note_by_default() {
        let h = harness(Verdict::Pass, Verdict::Pass, Verdict::Undetermined(NO_TESTS_FOUND.into()), false);
        let result = h.pipeline.verify(VerificationLevel::Strict, &ctx()).await;
        assert!(result.verified);
        let tests = result.check(CheckKind::Tests).unwrap();
        assert!(tests.passed);
        assert_eq!(tests.notes, vec![NO_TESTS_FOUND.to_string()]);
    }

    #[tokio::test]
    async fn test_strict_without_tests_fails_when_required() {
        let h = harness(Verdict::Pass, Verdict::Pass, Verdict::Undetermined(NO_TESTS_FOUND.into()), true);
        let result = h.pipeline.verify(VerificationLevel::Strict, &ctx()).await;
        assert!(!result.verified);
        assert_eq!(result.errors(), vec![NO_TESTS_FOUND.to_string()]);
    }

    #[tokio::test]
    async fn test_undetermined_syntax_is_a_pass_with_note() {
        let h = harness(Verdict::Undetermined("no checker".into()), Verdict::Pass, Verdict::Pass, false);
        let result = h.pipeline.verify(VerificationLevel::Standard, &ctx()).await;
        assert!(result.verified);
        assert_eq!(h.additional.calls(), 1);
    }

    #[tokio::test]
    async fn test_metrics_track_success_ratio() {
        let h = harness(Verdict::Pass, Verdict::Pass, Verdict::Pass, false);
        h.pipeline.verify(VerificationLevel::Basic, &ctx()).await;
        h.pipeline.verify(VerificationLevel::Basic, &ctx()).await;

        let failing = harness(Verdict::Fail("x".into()), Verdict::Pass, Verdict::Pass, false);
        failing.pipeline.verify(VerificationLevel::Basic, &ctx()).await;

        assert_eq!(h.metrics.counter_total(VERIFICATION_ATTEMPTS_TOTAL), 2);
        assert_eq!(h.metrics.counter_total(VERIFICATION_SUCCESSES_TOTAL), 2);
        assert_eq!(h.metrics.gauge(VERIFICATION_SUCCESS_RATIO, &[]), Some(1.0));
        assert_eq!(failing.metrics.gauge(VERIFICATION_SUCCESS_RATIO, &[]), Some(0.0));
    }
}
