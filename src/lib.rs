//! Reforge - AI-assisted codebase transformation
//!
//! Reforge runs transformation jobs over a repository: it copies the
//! repository into a working copy, picks the files to rewrite, asks an AI
//! backend for a rewrite of each file in bounded-concurrency batches,
//! verifies every candidate and writes back the ones the commit policy
//! allows. Jobs are persisted in SQLite and can be cancelled between batches.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): job and outcome models plus the ports
//! - **Service Layer** (`services`): orchestration, batching, per-file work
//! - **Adapters** (`adapters`): SQLite, HTTP collaborators, AI and verifier backends
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, wiring
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use reforge::infrastructure::{config::ConfigLoader, setup::build_orchestrator};
//! use reforge::JobRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let orchestrator = build_orchestrator(&config).await?;
//!     let job_id = orchestrator.submit(JobRequest::new("svc", "/srv/checkout", "optimize")).await?;
//!     let job = orchestrator.wait(job_id).await?;
//!     println!("{} files processed", job.processed_files);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, Job, JobRequest, JobResults, JobSpec, JobStatus, TransformationKind, TransformationOutcome,
    VerificationLevel, VerificationResult,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{JobOrchestrator, OrchestratorParts, OrchestratorSettings};
