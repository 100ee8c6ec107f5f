//! Domain errors for the Reforge transformation engine.

use thiserror::Error;
use uuid::Uuid;

use super::models::JobStatus;

/// Domain-level errors that can occur in the Reforge system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("Job {id} is already in terminal status '{status}'")]
    AlreadyTerminal { id: Uuid, status: JobStatus },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: JobStatus, to: JobStatus },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Workspace error: {0}")]
    WorkspaceError(String),

    #[error("Collaborator error: {0}")]
    CollaboratorError(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::WorkspaceError(err.to_string())
    }
}
