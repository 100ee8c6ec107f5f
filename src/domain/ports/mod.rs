//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces implemented by adapters:
//! - JobRepository / OutcomeRepository: job registry and outcome log
//! - AiBackend: text generation
//! - CandidateSelector / PatternRepository: remote collaborators
//! - SyntaxChecker / AdditionalCheck / TestRunner: verifier backends
//! - CancellationSignal: out-of-band cancel token
//! - MetricsSink: counters, gauges and histograms
//! - Workspace: per-job working copies

pub mod ai_backend;
pub mod cancellation;
pub mod candidate_selector;
pub mod job_repository;
pub mod metrics;
pub mod outcome_repository;
pub mod pattern_repository;
pub mod verifier;
pub mod workspace;

pub use ai_backend::{AiBackend, AiBackendError, GenerationOptions};
pub use cancellation::CancellationSignal;
pub use candidate_selector::{Candidate, CandidateQuery, CandidateSelector};
pub use job_repository::JobRepository;
pub use metrics::MetricsSink;
pub use outcome_repository::OutcomeRepository;
pub use pattern_repository::{PatternQuery, PatternRecord, PatternRepository, ReferencePattern};
pub use verifier::{AdditionalCheck, SyntaxChecker, TestRunner, Verdict, VerificationContext};
pub use workspace::Workspace;
