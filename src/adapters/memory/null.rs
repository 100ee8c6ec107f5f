//! No-op collaborators used when remote services are not configured.

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{
    Candidate, CandidateQuery, CandidateSelector, PatternQuery, PatternRecord, PatternRepository,
    ReferencePattern,
};

/// Candidate selector that always fails, forcing the directory-scan fallback.
#[derive(Debug, Clone, Default)]
pub struct NullCandidateSelector;

#[async_trait]
impl CandidateSelector for NullCandidateSelector {
    async fn list_candidates(&self, _query: &CandidateQuery) -> DomainResult<Vec<Candidate>> {
        Err(DomainError::CollaboratorError("candidate selector not configured".to_string()))
    }
}

/// Pattern repository that knows no patterns and discards everything stored.
#[derive(Debug, Clone, Default)]
pub struct NullPatternRepository;

#[async_trait]
impl PatternRepository for NullPatternRepository {
    async fn retrieve(&self, _query: &PatternQuery) -> DomainResult<Vec<ReferencePattern>> {
        Ok(Vec::new())
    }

    async fn store(&self, _record: &PatternRecord) -> DomainResult<()> {
        Ok(())
    }
}
