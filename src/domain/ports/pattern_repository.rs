use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::{ComplexityReport, TransformationKind};

/// Historical rewrite used to enrich a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePattern {
    pub description: String,
    #[serde(default)]
    pub example: Option<String>,
}

/// Query for reference patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternQuery {
    pub language: String,
    pub kind: TransformationKind,
    pub file_path: Option<String>,
    pub limit: usize,
}

/// A verified, applied rewrite reported back for future retrieval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternRecord {
    pub language: String,
    pub transformation_type: TransformationKind,
    pub file_path: String,
    pub before: String,
    pub after: String,
    pub summary: String,
    #[serde(skip)]
    pub complexity: Option<ComplexityReport>,
}

/// Knowledge collaborator storing successful before/after rewrites.
///
/// Both operations are best effort; callers log and swallow failures.
#[async_trait]
pub trait PatternRepository: Send + Sync {
    async fn retrieve(&self, query: &PatternQuery) -> DomainResult<Vec<ReferencePattern>>;

    async fn store(&self, record: &PatternRecord) -> DomainResult<()>;
}
