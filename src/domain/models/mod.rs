pub mod config;
pub mod file_task;
pub mod job;
pub mod outcome;
pub mod verification;

pub use config::{
    AiConfig, CancellationConfig, CollaboratorsConfig, Config, DatabaseConfig, LoggingConfig,
    RateLimitConfig, VerificationConfig, WorkerConfig, WorkspaceConfig,
};
pub use file_task::{detect_language, is_confined_path, FileTask};
pub use job::{
    BatchTally, Job, JobRequest, JobSpec, JobStatus, ModelOverrides, TransformationKind,
    VerificationLevel,
};
pub use outcome::{ComplexityReport, ComplexityStats, JobResults, TransformationOutcome};
pub use verification::{CheckKind, CheckResult, VerificationResult};
