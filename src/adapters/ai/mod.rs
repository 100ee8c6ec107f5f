//! AI generation backends.

pub mod mock;
pub mod ollama;

pub use mock::{MockAiBackend, MockCall};
pub use ollama::{OllamaBackend, OllamaConfig};
