use async_trait::async_trait;

use crate::domain::ports::{AdditionalCheck, Verdict, VerificationContext};

/// Rejects a candidate that erased a non-empty file.
#[derive(Debug, Clone, Default)]
pub struct NonEmptyCandidateCheck;

#[async_trait]
impl AdditionalCheck for NonEmptyCandidateCheck {
    async fn check(&self, ctx: &VerificationContext) -> Verdict {
        if ctx.candidate.trim().is_empty() && !ctx.original.trim().is_empty() {
            return Verdict::Fail("Transformed code is empty".to_string());
        }
        Verdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ctx(original: &str, candidate: &str) -> VerificationContext {
        VerificationContext {
            workspace_root: PathBuf::from("/tmp"),
            file_path: "a.py".to_string(),
            language: Some("python".to_string()),
            original: original.to_string(),
            candidate: candidate.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_candidate_fails() {
        let check = NonEmptyCandidateCheck;
        assert!(matches!(check.check(&ctx("x = 1", "  \n")).await, Verdict::Fail(_)));
        assert_eq!(check.check(&ctx("x = 1", "x = 2")).await, Verdict::Pass);
        assert_eq!(check.check(&ctx("", "")).await, Verdict::Pass);
    }
}
