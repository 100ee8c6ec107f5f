//! HTTP clients for the remote collaborator services.

pub mod candidate_selector;
pub mod pattern_repository;

pub use candidate_selector::HttpCandidateSelector;
pub use pattern_repository::HttpPatternRepository;

use reqwest::Client;
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};

fn build_client(timeout_secs: u64) -> DomainResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DomainError::ValidationFailed(format!("Failed to create HTTP client: {}", e)))
}

fn collaborator_error(service: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::CollaboratorError(format!("{service}: {err}"))
}
