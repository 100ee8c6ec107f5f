//! Transformation job domain model.
//!
//! A job is one request to transform a set of files in a repository under a
//! single transformation kind and verification level. Its spec is immutable
//! once validated; only status and progress counters change over its lifetime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Lifecycle status of a transformation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted and persisted, not yet started
    Pending,
    /// Execution in progress
    Running,
    /// All batches processed
    Completed,
    /// Aborted by a job-fatal error
    Failed,
    /// Stopped at a batch boundary on request
    Cancelled,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        Self::Pending,
        Self::Running,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<JobStatus> {
        match self {
            Self::Pending => vec![Self::Running, Self::Failed, Self::Cancelled],
            Self::Running => vec![Self::Completed, Self::Failed, Self::Cancelled],
            Self::Completed | Self::Failed | Self::Cancelled => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of rewrite requested for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationKind {
    Refactor,
    Optimize,
    Prune,
    Merge,
    Modernize,
    FixSecurity,
}

impl TransformationKind {
    pub const ALL: [TransformationKind; 6] = [
        Self::Refactor,
        Self::Optimize,
        Self::Prune,
        Self::Merge,
        Self::Modernize,
        Self::FixSecurity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refactor => "refactor",
            Self::Optimize => "optimize",
            Self::Prune => "prune",
            Self::Merge => "merge",
            Self::Modernize => "modernize",
            Self::FixSecurity => "fix_security",
        }
    }

    /// Parse a kind name; accepts any case and `-` in place of `_`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "refactor" => Some(Self::Refactor),
            "optimize" => Some(Self::Optimize),
            "prune" => Some(Self::Prune),
            "merge" => Some(Self::Merge),
            "modernize" => Some(Self::Modernize),
            "fix_security" => Some(Self::FixSecurity),
            _ => None,
        }
    }

    /// Short description shown when listing available kinds.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Refactor => "Restructure code without changing its external behavior",
            Self::Optimize => "Improve code performance and efficiency",
            Self::Prune => "Remove dead, unused or redundant code",
            Self::Merge => "Combine similar functionality into shared abstractions",
            Self::Modernize => "Update code to modern language features and idioms",
            Self::FixSecurity => "Fix security vulnerabilities",
        }
    }

    /// Imperative directive embedded in the AI prompt.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Refactor => {
                "Refactor this code to improve readability and maintainability without changing its behavior."
            }
            Self::Optimize => {
                "Optimize this code for better performance while maintaining the same functionality."
            }
            Self::Prune => "Remove unused code, dead code paths, and unnecessary complexity.",
            Self::Merge => "Merge similar or duplicate functionality into shared abstractions.",
            Self::Modernize => "Update this code to use modern language features and best practices.",
            Self::FixSecurity => "Fix security vulnerabilities in this code.",
        }
    }

    /// Kinds whose large inputs are routed to the specialized model.
    pub fn is_high_risk(&self) -> bool {
        matches!(self, Self::FixSecurity | Self::Refactor)
    }
}

impl fmt::Display for TransformationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Depth of post-rewrite checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationLevel {
    /// No checks; every candidate is verified
    None,
    /// Syntax check only
    Basic,
    /// Syntax check plus additional checks
    Standard,
    /// Syntax, additional checks and the project's test suite
    Strict,
}

impl Default for VerificationLevel {
    fn default() -> Self {
        Self::Standard
    }
}

impl VerificationLevel {
    pub const ALL: [VerificationLevel; 4] = [Self::None, Self::Basic, Self::Standard, Self::Strict];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Strict => "strict",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Some(Self::None),
            "basic" => Some(Self::Basic),
            "standard" => Some(Self::Standard),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::None => "No verification, apply transformations directly",
            Self::Basic => "Basic syntax verification",
            Self::Standard => "Syntax verification plus additional static checks",
            Self::Strict => "Full verification including the project's test suite",
        }
    }

    pub fn runs_syntax(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn runs_additional_checks(&self) -> bool {
        matches!(self, Self::Standard | Self::Strict)
    }

    pub fn runs_tests(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_BATCH_SIZE: u32 = 10;
pub const MIN_BATCH_SIZE: u32 = 1;
pub const MAX_BATCH_SIZE: u32 = 100;
pub const DEFAULT_MAX_FILE_SIZE_KB: u32 = 50;
pub const MIN_FILE_SIZE_KB: u32 = 1;
pub const MAX_FILE_SIZE_KB: u32 = 500;

/// Raw, unvalidated job request as received from a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequest {
    pub repo_id: String,
    /// Location of the checked-out repository to copy into a working copy.
    pub repo_url: String,
    pub branch: Option<String>,
    pub transformation_type: String,
    pub file_paths: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub verification_level: Option<String>,
    pub safe_mode: Option<bool>,
    pub batch_size: Option<u32>,
    pub max_file_size_kb: Option<u32>,
    pub preferred_model: Option<String>,
    pub fallback_model: Option<String>,
    pub specialized_model: Option<String>,
}

impl JobRequest {
    pub fn new(
        repo_id: impl Into<String>,
        repo_url: impl Into<String>,
        transformation_type: impl Into<String>,
    ) -> Self {
        Self {
            repo_id: repo_id.into(),
            repo_url: repo_url.into(),
            transformation_type: transformation_type.into(),
            ..Default::default()
        }
    }

    /// Validate the request and apply defaults.
    pub fn validate(self) -> DomainResult<JobSpec> {
        if self.repo_id.trim().is_empty() {
            return Err(DomainError::ValidationFailed("repo_id cannot be empty".to_string()));
        }
        if self.repo_url.trim().is_empty() {
            return Err(DomainError::ValidationFailed("repo_url cannot be empty".to_string()));
        }

        let kind = TransformationKind::from_str(&self.transformation_type).ok_or_else(|| {
            DomainError::ValidationFailed(format!(
                "transformation_type '{}' is not one of: {}",
                self.transformation_type,
                TransformationKind::ALL.iter().map(TransformationKind::as_str).collect::<Vec<_>>().join(", ")
            ))
        })?;

        let verification_level = match self.verification_level.as_deref() {
            Some(raw) => VerificationLevel::from_str(raw).ok_or_else(|| {
                DomainError::ValidationFailed(format!(
                    "verification_level '{}' is not one of: none, basic, standard, strict",
                    raw
                ))
            })?,
            None => VerificationLevel::default(),
        };

        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(DomainError::ValidationFailed(format!(
                "batch_size must be between {} and {}, got {}",
                MIN_BATCH_SIZE, MAX_BATCH_SIZE, batch_size
            )));
        }

        let max_file_size_kb = self.max_file_size_kb.unwrap_or(DEFAULT_MAX_FILE_SIZE_KB);
        if !(MIN_FILE_SIZE_KB..=MAX_FILE_SIZE_KB).contains(&max_file_size_kb) {
            return Err(DomainError::ValidationFailed(format!(
                "max_file_size_kb must be between {} and {}, got {}",
                MIN_FILE_SIZE_KB, MAX_FILE_SIZE_KB, max_file_size_kb
            )));
        }

        let languages = self
            .languages
            .map(|langs| langs.into_iter().map(|l| l.trim().to_lowercase()).filter(|l| !l.is_empty()).collect::<Vec<_>>())
            .filter(|langs| !langs.is_empty());

        Ok(JobSpec {
            repo_id: self.repo_id,
            repo_url: self.repo_url,
            branch: self
                .branch
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            kind,
            file_paths: self.file_paths.filter(|paths| !paths.is_empty()),
            languages,
            verification_level,
            safe_mode: self.safe_mode.unwrap_or(true),
            batch_size,
            max_file_size_kb,
            models: ModelOverrides {
                preferred: self.preferred_model,
                fallback: self.fallback_model,
                specialized: self.specialized_model,
            },
        })
    }
}

/// Per-job overrides of the configured model names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOverrides {
    pub preferred: Option<String>,
    pub fallback: Option<String>,
    pub specialized: Option<String>,
}

/// Validated, immutable job specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub repo_id: String,
    pub repo_url: String,
    pub branch: String,
    pub kind: TransformationKind,
    /// Explicit target files, relative to the repository root.
    pub file_paths: Option<Vec<String>>,
    /// Language allow-list; `None` allows every language.
    pub languages: Option<Vec<String>>,
    pub verification_level: VerificationLevel,
    pub safe_mode: bool,
    pub batch_size: u32,
    pub max_file_size_kb: u32,
    #[serde(default)]
    pub models: ModelOverrides,
}

impl JobSpec {
    pub fn max_file_size_bytes(&self) -> u64 {
        u64::from(self.max_file_size_kb) * 1024
    }

    /// Whether a file of the given language passes the allow-list.
    pub fn allows_language(&self, language: Option<&str>) -> bool {
        match &self.languages {
            None => true,
            Some(allowed) => language.is_some_and(|l| allowed.iter().any(|a| a == l)),
        }
    }
}

/// A transformation job and its mutable progress state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub spec: JobSpec,
    pub status: JobStatus,
    pub total_files: u32,
    pub processed_files: u32,
    pub successful_transformations: u32,
    pub failed_transformations: u32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new pending job for a validated spec.
    pub fn new(spec: JobSpec) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            spec,
            status: JobStatus::Pending,
            total_files: 0,
            processed_files: 0,
            successful_transformations: 0,
            failed_transformations: 0,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Fraction of resolved files already processed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        f64::from(self.processed_files) / f64::from(self.total_files)
    }
}

/// Counter increments contributed by one finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub processed: u32,
    pub successful: u32,
    pub failed: u32,
}

impl BatchTally {
    pub fn record(&mut self, success: bool) {
        self.processed += 1;
        if success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JobRequest {
        JobRequest::new("repo-1", "/tmp/repo", "refactor")
    }

    #[test]
    fn test_status_round_trip_and_terminality() {
        for status in JobStatus::ALL {
            assert_eq!(JobStatus::from_str(status.as_str()), Some(status));
        }
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert_eq!(JobStatus::from_str("canceled"), Some(JobStatus::Cancelled));
    }

    #[test]
    fn test_status_transitions() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Cancelled));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Cancelled.valid_transitions().is_empty());
    }

    #[test]
    fn test_kind_parsing_accepts_legacy_spelling() {
        assert_eq!(TransformationKind::from_str("FIX_SECURITY"), Some(TransformationKind::FixSecurity));
        assert_eq!(TransformationKind::from_str("fix-security"), Some(TransformationKind::FixSecurity));
        assert_eq!(TransformationKind::from_str("Refactor"), Some(TransformationKind::Refactor));
        assert_eq!(TransformationKind::from_str("rewrite"), None);
        assert!(TransformationKind::FixSecurity.is_high_risk());
        assert!(!TransformationKind::Prune.is_high_risk());
    }

    #[test]
    fn test_validate_applies_defaults() {
        let spec = request().validate().unwrap();
        assert_eq!(spec.branch, "main");
        assert_eq!(spec.kind, TransformationKind::Refactor);
        assert_eq!(spec.verification_level, VerificationLevel::Standard);
        assert!(spec.safe_mode);
        assert_eq!(spec.batch_size, 10);
        assert_eq!(spec.max_file_size_kb, 50);
        assert!(spec.file_paths.is_none());
        assert!(spec.languages.is_none());
    }

    #[test]
    fn test_validate_rejects_out_of_range_batch_size() {
        for size in [0, 101] {
            let req = JobRequest { batch_size: Some(size), ..request() };
            let err = req.validate().unwrap_err();
            assert!(matches!(err, DomainError::ValidationFailed(ref m) if m.contains("batch_size")));
        }
        let req = JobRequest { batch_size: Some(100), ..request() };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_file_size() {
        for size in [0, 501] {
            let req = JobRequest { max_file_size_kb: Some(size), ..request() };
            let err = req.validate().unwrap_err();
            assert!(matches!(err, DomainError::ValidationFailed(ref m) if m.contains("max_file_size_kb")));
        }
    }

    #[test]
    fn test_validate_rejects_unknown_enumerations() {
        let req = JobRequest { transformation_type: "rewrite".into(), ..request() };
        assert!(matches!(req.validate(), Err(DomainError::ValidationFailed(_))));

        let req = JobRequest { verification_level: Some("paranoid".into()), ..request() };
        assert!(matches!(req.validate(), Err(DomainError::ValidationFailed(_))));
    }

    #[test]
    fn test_validate_rejects_empty_repo() {
        let req = JobRequest { repo_id: "  ".into(), ..request() };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_language_allow_list() {
        let req = JobRequest { languages: Some(vec!["Python".into()]), ..request() };
        let spec = req.validate().unwrap();
        assert!(spec.allows_language(Some("python")));
        assert!(!spec.allows_language(Some("java")));
        assert!(!spec.allows_language(None));

        let open = request().validate().unwrap();
        assert!(open.allows_language(None));
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new(request().validate().unwrap());
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.processed_files, 0);
        assert!((job.progress() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_batch_tally() {
        let mut tally = BatchTally::default();
        tally.record(true);
        tally.record(false);
        tally.record(true);
        assert_eq!(tally, BatchTally { processed: 3, successful: 2, failed: 1 });
    }
}
