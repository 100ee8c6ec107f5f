//! Per-file transformation outcomes and job result pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::file_task::FileTask;
use super::job::{Job, VerificationLevel};
use super::verification::VerificationResult;

/// Size measurements of one version of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityStats {
    pub total_lines: u64,
    pub non_empty_lines: u64,
    pub characters: u64,
    pub average_line_length: f64,
}

/// Before/after comparison of a rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub before: ComplexityStats,
    pub after: ComplexityStats,
    /// Percentage of lines removed; negative when the file grew.
    pub line_change_pct: f64,
    /// Percentage of characters removed; negative when the file grew.
    pub char_change_pct: f64,
    pub is_smaller: bool,
}

/// Result of processing one scheduled file. Never mutated once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationOutcome {
    pub id: Uuid,
    pub job_id: Uuid,
    pub file_path: String,
    pub language: Option<String>,
    /// Model whose output was used, if any call was made.
    pub model: Option<String>,
    /// Whether the rewrite was written to the working copy.
    pub applied: bool,
    pub summary: String,
    pub verification: VerificationResult,
    pub complexity: Option<ComplexityReport>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl TransformationOutcome {
    /// Outcome for a file whose processing failed before producing a verdict.
    pub fn failed(
        job_id: Uuid,
        task: &FileTask,
        level: VerificationLevel,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        Self {
            id: Uuid::new_v4(),
            job_id,
            file_path: task.path.clone(),
            language: task.language.clone(),
            model: None,
            applied: false,
            summary: String::new(),
            verification: VerificationResult::not_run(level, error.clone()),
            complexity: None,
            error: Some(error),
            duration_ms: 0,
            created_at: Utc::now(),
        }
    }

    /// A file counts as successful when its rewrite was applied without error.
    pub fn is_success(&self) -> bool {
        self.applied && self.error.is_none()
    }

    pub fn status_label(&self) -> &'static str {
        match (self.applied, self.error.is_some()) {
            (true, false) => "success",
            (true, true) => "applied_with_errors",
            (false, _) => "failed",
        }
    }
}

/// Paginated view over a job's outcome log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResults {
    pub job: Job,
    pub outcomes: Vec<TransformationOutcome>,
    /// Total number of outcomes stored for the job, across all pages.
    pub total: u64,
}
