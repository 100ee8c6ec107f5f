//! Ollama generation API backend.
//!
//! Sends non-streaming `POST /api/generate` requests. Requests are throttled
//! by a token-bucket limiter shared by every worker using the backend.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AiConfig, RateLimitConfig};
use crate::domain::ports::{AiBackend, AiBackendError, GenerationOptions};

/// Configuration for the Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// API base URL.
    pub base_url: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Sustained request rate.
    pub requests_per_second: f64,
    /// Token bucket capacity.
    pub burst_size: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 120,
            requests_per_second: 10.0,
            burst_size: 20,
        }
    }
}

impl OllamaConfig {
    pub fn from_config(ai: &AiConfig, rate_limit: &RateLimitConfig) -> Self {
        Self {
            base_url: ai.base_url.clone(),
            timeout_secs: ai.timeout_secs,
            requests_per_second: rate_limit.requests_per_second,
            burst_size: rate_limit.burst_size,
        }
    }

    /// Create config pointing at a custom base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn quota(&self) -> DomainResult<Quota> {
        if !(self.requests_per_second.is_finite() && self.requests_per_second > 0.0) {
            return Err(DomainError::ValidationFailed(format!(
                "requests_per_second must be positive, got {}",
                self.requests_per_second
            )));
        }
        let burst = NonZeroU32::new(self.burst_size)
            .ok_or_else(|| DomainError::ValidationFailed("burst_size must be at least 1".to_string()))?;
        let period = Duration::from_secs_f64(1.0 / self.requests_per_second);
        Quota::with_period(period)
            .map(|quota| quota.allow_burst(burst))
            .ok_or_else(|| DomainError::ValidationFailed("rate limit period must be non-zero".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama HTTP backend.
pub struct OllamaBackend {
    config: OllamaConfig,
    client: Client,
    limiter: DefaultDirectRateLimiter,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::ValidationFailed(format!("Failed to create HTTP client: {}", e)))?;
        let limiter = RateLimiter::direct(config.quota()?);

        Ok(Self { config, client, limiter })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl AiBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, model: &str, prompt: &str, options: &GenerationOptions) -> Result<String, AiBackendError> {
        self.limiter.until_ready().await;

        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: options.temperature,
                top_p: options.top_p,
                max_tokens: options.max_tokens,
            },
        };

        tracing::debug!(model, prompt_chars = prompt.len(), "sending generation request");

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiBackendError::Timeout(self.config.timeout_secs)
                } else {
                    AiBackendError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model, status, "generation request rejected");
            return Err(AiBackendError::Status { status, body });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AiBackendError::Decode(e.to_string()))?;

        if body.response.trim().is_empty() {
            return Err(AiBackendError::EmptyResponse);
        }
        Ok(body.response)
    }
}
