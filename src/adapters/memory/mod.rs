//! In-process adapters: cancellation tokens, metrics and null collaborators.

pub mod cancellation;
pub mod metrics;
pub mod null;

pub use cancellation::InMemoryCancellationSignal;
pub use metrics::InMemoryMetrics;
pub use null::{NullCandidateSelector, NullPatternRepository};
