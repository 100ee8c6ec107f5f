use async_trait::async_trait;
use std::path::PathBuf;

/// Verdict of a single verifier capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(String),
    /// The capability does not apply (no checker configured, no tests detected).
    Undetermined(String),
}

/// Everything a verifier needs to judge one candidate rewrite.
#[derive(Debug, Clone)]
pub struct VerificationContext {
    /// Root of the job's working copy
    pub workspace_root: PathBuf,
    /// File path relative to the working-copy root
    pub file_path: String,
    pub language: Option<String>,
    pub original: String,
    pub candidate: String,
}

impl VerificationContext {
    pub fn absolute_path(&self) -> PathBuf {
        self.workspace_root.join(&self.file_path)
    }
}

/// Language-specific syntax checking of a candidate in isolation.
#[async_trait]
pub trait SyntaxChecker: Send + Sync {
    async fn check_syntax(&self, ctx: &VerificationContext) -> Verdict;
}

/// Generic checks run after syntax at `standard` and above.
#[async_trait]
pub trait AdditionalCheck: Send + Sync {
    async fn check(&self, ctx: &VerificationContext) -> Verdict;
}

/// Runs the project's test suite against a candidate.
#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run_tests(&self, ctx: &VerificationContext) -> Verdict;
}
