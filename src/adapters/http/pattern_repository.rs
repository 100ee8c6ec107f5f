//! Knowledge-repository client for reference rewrite patterns.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{build_client, collaborator_error};
use crate::domain::errors::DomainResult;
use crate::domain::ports::{PatternQuery, PatternRecord, PatternRepository, ReferencePattern};

const SERVICE: &str = "knowledge repository";

#[derive(Debug, Deserialize)]
struct PatternsResponse {
    #[serde(default)]
    patterns: Vec<ReferencePattern>,
}

pub struct HttpPatternRepository {
    base_url: String,
    client: Client,
}

impl HttpPatternRepository {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> DomainResult<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout_secs)?,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/patterns/transformation", self.base_url)
    }
}

#[async_trait]
impl PatternRepository for HttpPatternRepository {
    async fn retrieve(&self, query: &PatternQuery) -> DomainResult<Vec<ReferencePattern>> {
        let limit = query.limit.to_string();
        let mut params = vec![
            ("language", query.language.as_str()),
            ("transformation_type", query.kind.as_str()),
            ("limit", limit.as_str()),
        ];
        if let Some(path) = &query.file_path {
            params.push(("file_path", path.as_str()));
        }

        let response = self
            .client
            .get(self.endpoint())
            .query(&params)
            .send()
            .await
            .map_err(|e| collaborator_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(collaborator_error(SERVICE, format!("status {}", response.status())));
        }

        let body: PatternsResponse = response.json().await.map_err(|e| collaborator_error(SERVICE, e))?;
        Ok(body.patterns)
    }

    async fn store(&self, record: &PatternRecord) -> DomainResult<()> {
        let pattern = serde_json::to_value(record)?;
        let metrics = serde_json::to_value(record.complexity)?;
        let payload = json!({
            "pattern": pattern,
            "metadata": { "metrics": metrics },
        });

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| collaborator_error(SERVICE, e))?;

        if response.status() != StatusCode::CREATED {
            return Err(collaborator_error(SERVICE, format!("expected 201, got {}", response.status())));
        }
        Ok(())
    }
}
