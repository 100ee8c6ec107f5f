//! Transformation engine services.

pub mod batch_coordinator;
pub mod complexity;
pub mod file_resolver;
pub mod job_orchestrator;
pub mod model_selection;
pub mod prompt;
pub mod response_parser;
pub mod transformation_worker;
pub mod verification_pipeline;

pub use batch_coordinator::BatchCoordinator;
pub use file_resolver::FileResolver;
pub use job_orchestrator::{JobOrchestrator, OrchestratorParts, OrchestratorSettings};
pub use model_selection::{ModelChoice, ModelSelector, ModelTier};
pub use response_parser::{parse_response, ParsedResponse};
pub use transformation_worker::{JobContext, TransformationWorker, WorkerSettings};
pub use verification_pipeline::VerificationPipeline;
