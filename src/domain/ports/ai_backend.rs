use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by an AI generation backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AiBackendError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("backend returned an empty response")]
    EmptyResponse,

    #[error("request timed out after {0}s")]
    Timeout(u64),
}

/// Sampling options passed with every generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.95,
            max_tokens: 4096,
        }
    }
}

/// Synchronous request/response text generation.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Generate a completion for `prompt` with the given model
    async fn generate(&self, model: &str, prompt: &str, options: &GenerationOptions) -> Result<String, AiBackendError>;
}
