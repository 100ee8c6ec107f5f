//! Code-analyzer client ranking files by transformation priority.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{build_client, collaborator_error};
use crate::domain::errors::DomainResult;
use crate::domain::ports::{Candidate, CandidateQuery, CandidateSelector};

const SERVICE: &str = "code analyzer";

#[derive(Debug, Deserialize)]
struct CandidatesResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

pub struct HttpCandidateSelector {
    base_url: String,
    client: Client,
}

impl HttpCandidateSelector {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> DomainResult<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl CandidateSelector for HttpCandidateSelector {
    async fn list_candidates(&self, query: &CandidateQuery) -> DomainResult<Vec<Candidate>> {
        let limit = query.limit.to_string();
        let mut params = vec![
            ("repo_id", query.repo_id.as_str()),
            ("transformation_type", query.kind.as_str()),
            ("limit", limit.as_str()),
        ];
        if let Some(language) = &query.language {
            params.push(("language", language.as_str()));
        }

        let response = self
            .client
            .get(format!("{}/api/analysis/transformation-candidates", self.base_url))
            .query(&params)
            .send()
            .await
            .map_err(|e| collaborator_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(collaborator_error(SERVICE, format!("status {}", response.status())));
        }

        let body: CandidatesResponse = response.json().await.map_err(|e| collaborator_error(SERVICE, e))?;
        tracing::debug!(repo_id = %query.repo_id, count = body.candidates.len(), "received transformation candidates");
        Ok(body.candidates)
    }
}
