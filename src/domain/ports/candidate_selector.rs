use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::TransformationKind;

/// Query sent to the candidate selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub repo_id: String,
    pub kind: TransformationKind,
    pub language: Option<String>,
    pub limit: u32,
}

/// A file ranked by the candidate selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(alias = "path")]
    pub file_path: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub priority: Option<f64>,
    #[serde(default)]
    pub metrics: Option<serde_json::Value>,
}

/// Collaborator that ranks repository files by transformation priority.
///
/// Failures are expected; callers fall back to a directory scan.
#[async_trait]
pub trait CandidateSelector: Send + Sync {
    async fn list_candidates(&self, query: &CandidateQuery) -> DomainResult<Vec<Candidate>>;
}
