//! Per-file transformation.
//!
//! One call to [`TransformationWorker::process`] reads a file from the job's
//! working copy, asks the AI backend for a rewrite (falling back to a second
//! model at most once), verifies the candidate and writes it back when the
//! commit policy allows. Every call yields exactly one outcome; errors become
//! failed outcomes instead of propagating.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::complexity;
use super::model_selection::{ModelChoice, ModelSelector};
use super::prompt::{build_prompt, PromptInput};
use super::response_parser::{parse_response, ParsedResponse};
use super::verification_pipeline::VerificationPipeline;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    is_confined_path, ComplexityReport, FileTask, TransformationKind, TransformationOutcome, VerificationLevel,
};
use crate::domain::ports::metrics::{
    COMPLEXITY_REDUCTION_PERCENTAGE, FILE_SIZE_REDUCTION_PERCENTAGE, MODEL_FALLBACKS_TOTAL,
    TRANSFORMATIONS_TOTAL, TRANSFORMATION_DURATION_SECONDS, TRANSFORMATION_ERRORS_TOTAL,
};
use crate::domain::ports::{
    AiBackend, AiBackendError, GenerationOptions, MetricsSink, PatternQuery, PatternRecord, PatternRepository,
    ReferencePattern, VerificationContext,
};

/// Per-job settings shared by every worker call in the job.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_id: Uuid,
    pub workspace_root: PathBuf,
    pub kind: TransformationKind,
    pub verification_level: VerificationLevel,
    pub safe_mode: bool,
    pub models: ModelSelector,
}

/// Process-wide worker settings.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub generation: GenerationOptions,
    pub ai_timeout: Duration,
    pub max_patterns: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            generation: GenerationOptions::default(),
            ai_timeout: Duration::from_secs(120),
            max_patterns: 3,
        }
    }
}

/// Why the preferred model's reply was retried on the fallback model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Unchanged,
    Unparseable,
    BackendError,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Unparseable => "unparseable",
            Self::BackendError => "backend_error",
        }
    }

    fn of(reply: &Result<ParsedResponse, AiBackendError>, original: &str) -> Option<Self> {
        match reply {
            Err(_) => Some(Self::BackendError),
            Ok(parsed) if parsed.is_unrecognized() => Some(Self::Unparseable),
            Ok(parsed) if parsed.code() == original => Some(Self::Unchanged),
            Ok(_) => None,
        }
    }
}

/// Final rewrite produced by the model exchange.
struct Rewrite {
    model: String,
    code: String,
    summary: String,
    backend_error: Option<String>,
}

pub struct TransformationWorker {
    ai: Arc<dyn AiBackend>,
    patterns: Arc<dyn PatternRepository>,
    verifier: Arc<VerificationPipeline>,
    metrics: Arc<dyn MetricsSink>,
    settings: WorkerSettings,
}

impl TransformationWorker {
    pub fn new(
        ai: Arc<dyn AiBackend>,
        patterns: Arc<dyn PatternRepository>,
        verifier: Arc<VerificationPipeline>,
        metrics: Arc<dyn MetricsSink>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            ai,
            patterns,
            verifier,
            metrics,
            settings,
        }
    }

    /// Transform one file. Never fails; errors are recorded on the outcome.
    #[instrument(skip(self, ctx, task), fields(job_id = %ctx.job_id, file = %task.path))]
    pub async fn process(&self, ctx: &JobContext, task: &FileTask) -> TransformationOutcome {
        let started = Instant::now();

        let mut outcome = match self.transform(ctx, task).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "transformation failed");
                self.metrics
                    .increment_counter(TRANSFORMATION_ERRORS_TOTAL, &[("error_type", "transformation_error")], 1);
                TransformationOutcome::failed(ctx.job_id, task, ctx.verification_level, e.to_string())
            }
        };

        let elapsed = started.elapsed();
        outcome.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.metrics
            .observe_histogram(TRANSFORMATION_DURATION_SECONDS, &[], elapsed.as_secs_f64());
        outcome
    }

    async fn transform(&self, ctx: &JobContext, task: &FileTask) -> DomainResult<TransformationOutcome> {
        if !is_confined_path(&task.path) {
            return Err(DomainError::WorkspaceError(format!(
                "{} is outside the working copy",
                task.path
            )));
        }
        let path = ctx.workspace_root.join(&task.path);
        let original = tokio::fs::read_to_string(&path).await?;
        let language = task.language_or_unknown();

        let patterns = self.reference_patterns(ctx, task).await;
        let prompt = build_prompt(&PromptInput {
            kind: ctx.kind,
            file_path: &task.path,
            language,
            code: &original,
            patterns: &patterns,
        });

        let rewrite = self.rewrite(ctx, &prompt, &original).await;

        let verification = self
            .verifier
            .verify(
                ctx.verification_level,
                &VerificationContext {
                    workspace_root: ctx.workspace_root.clone(),
                    file_path: task.path.clone(),
                    language: task.language.clone(),
                    original: original.clone(),
                    candidate: rewrite.code.clone(),
                },
            )
            .await;

        let (applied, error) = match &rewrite.backend_error {
            Some(e) => {
                self.metrics
                    .increment_counter(TRANSFORMATION_ERRORS_TOTAL, &[("error_type", "ai_backend_error")], 1);
                (false, Some(e.clone()))
            }
            None if verification.verified || !ctx.safe_mode => {
                tokio::fs::write(&path, &rewrite.code).await?;
                (true, None)
            }
            None => (false, Some(format!("Verification failed: {}", verification.errors().join("; ")))),
        };

        let report = complexity::compare(&original, &rewrite.code);
        if applied {
            info!(model = %rewrite.model, verified = verification.verified, "rewrite applied");
            self.metrics
                .increment_counter(TRANSFORMATIONS_TOTAL, &[("type", ctx.kind.as_str())], 1);
            self.metrics.observe_histogram(
                COMPLEXITY_REDUCTION_PERCENTAGE,
                &[("transformation_type", ctx.kind.as_str())],
                report.line_change_pct,
            );
            self.metrics
                .observe_histogram(FILE_SIZE_REDUCTION_PERCENTAGE, &[], report.char_change_pct);

            if verification.verified {
                self.store_pattern(ctx, task, &original, &rewrite, report).await;
            }
        } else {
            info!(model = %rewrite.model, error = ?error, "rewrite not applied");
        }

        Ok(TransformationOutcome {
            id: Uuid::new_v4(),
            job_id: ctx.job_id,
            file_path: task.path.clone(),
            language: task.language.clone(),
            model: Some(rewrite.model),
            applied,
            summary: rewrite.summary,
            verification,
            complexity: Some(report),
            error,
            duration_ms: 0,
            created_at: chrono::Utc::now(),
        })
    }

    /// Ask the selected model for a rewrite, retrying once on the fallback model.
    async fn rewrite(&self, ctx: &JobContext, prompt: &str, original: &str) -> Rewrite {
        let choice = ctx.models.select(ctx.kind, original);
        let mut reply = self.generate(&choice, prompt, original).await;
        let mut model = choice.model.clone();

        if choice.may_fall_back() {
            if let Some(reason) = FallbackReason::of(&reply, original) {
                let fallback = ctx.models.fallback();
                info!(from = %choice.model, to = %fallback.model, reason = reason.as_str(), "falling back to second model");
                self.metrics
                    .increment_counter(MODEL_FALLBACKS_TOTAL, &[("reason", reason.as_str())], 1);
                reply = self.generate(&fallback, prompt, original).await;
                model = fallback.model;
            }
        }

        match reply {
            Ok(parsed) => {
                let (code, summary) = parsed.into_parts();
                Rewrite {
                    model,
                    code,
                    summary,
                    backend_error: None,
                }
            }
            Err(e) => Rewrite {
                model,
                code: original.to_string(),
                summary: format!("No changes made (AI backend error: {e})"),
                backend_error: Some(format!("AI backend error: {e}")),
            },
        }
    }

    async fn generate(
        &self,
        choice: &ModelChoice,
        prompt: &str,
        original: &str,
    ) -> Result<ParsedResponse, AiBackendError> {
        debug!(model = %choice.model, tier = choice.tier.as_str(), "requesting rewrite");
        let response = tokio::time::timeout(
            self.settings.ai_timeout,
            self.ai.generate(&choice.model, prompt, &self.settings.generation),
        )
        .await
        .map_err(|_| AiBackendError::Timeout(self.settings.ai_timeout.as_secs()))??;

        if response.trim().is_empty() {
            return Err(AiBackendError::EmptyResponse);
        }
        Ok(parse_response(&response, original))
    }

    async fn reference_patterns(&self, ctx: &JobContext, task: &FileTask) -> Vec<ReferencePattern> {
        if self.settings.max_patterns == 0 {
            return Vec::new();
        }
        let query = PatternQuery {
            language: task.language_or_unknown().to_string(),
            kind: ctx.kind,
            file_path: Some(task.path.clone()),
            limit: self.settings.max_patterns,
        };
        match self.patterns.retrieve(&query).await {
            Ok(patterns) => patterns,
            Err(e) => {
                debug!(error = %e, "pattern retrieval failed, continuing without patterns");
                Vec::new()
            }
        }
    }

    async fn store_pattern(
        &self,
        ctx: &JobContext,
        task: &FileTask,
        original: &str,
        rewrite: &Rewrite,
        report: ComplexityReport,
    ) {
        let record = PatternRecord {
            language: task.language_or_unknown().to_string(),
            transformation_type: ctx.kind,
            file_path: task.path.clone(),
            before: original.to_string(),
            after: rewrite.code.clone(),
            summary: rewrite.summary.clone(),
            complexity: Some(report),
        };
        if let Err(e) = self.patterns.store(&record).await {
            warn!(error = %e, "failed to store transformation pattern");
        }
    }
}
