//! Verification verdicts for candidate rewrites.

use serde::{Deserialize, Serialize};

use super::job::VerificationLevel;

/// Named stages of the verification ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Syntax,
    Additional,
    Tests,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Additional => "additional",
            Self::Tests => "tests",
        }
    }
}

/// Result of one stage of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: CheckKind,
    pub passed: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Informational notes that do not affect the verdict.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl CheckResult {
    pub fn pass(check: CheckKind) -> Self {
        Self {
            check,
            passed: true,
            errors: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn fail(check: CheckKind, error: impl Into<String>) -> Self {
        Self {
            check,
            passed: false,
            errors: vec![error.into()],
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Overall verdict plus the ordered checks that produced it.
///
/// Checks after the first failing one are never run, so `checks` ends at the
/// failing stage when `verified` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    pub level: VerificationLevel,
    pub checks: Vec<CheckResult>,
}

impl VerificationResult {
    pub fn new(level: VerificationLevel) -> Self {
        Self {
            verified: true,
            level,
            checks: Vec::new(),
        }
    }

    /// Append a stage result; a failing stage flips the verdict.
    pub fn push(&mut self, check: CheckResult) {
        if !check.passed {
            self.verified = false;
        }
        self.checks.push(check);
    }

    /// Verdict recorded for a file that never reached verification.
    pub fn not_run(level: VerificationLevel, reason: impl Into<String>) -> Self {
        Self {
            verified: false,
            level,
            checks: vec![CheckResult::fail(CheckKind::Syntax, reason)],
        }
    }

    /// All errors from failed stages, in ladder order.
    pub fn errors(&self) -> Vec<String> {
        self.checks.iter().flat_map(|c| c.errors.iter().cloned()).collect()
    }

    pub fn check(&self, kind: CheckKind) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.check == kind)
    }
}
