//! Scripted AI backend for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::ports::{AiBackend, AiBackendError, GenerationOptions};

type Reply = Result<String, AiBackendError>;
type Responder = Arc<dyn Fn(&str, &str) -> Reply + Send + Sync>;

/// One recorded `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub model: String,
    pub prompt: String,
}

/// AI backend returning scripted replies.
///
/// Per-model queued replies are consumed first; once a model's queue is
/// empty the responder decides the reply.
pub struct MockAiBackend {
    responder: Responder,
    queued: Arc<RwLock<HashMap<String, VecDeque<Reply>>>>,
    calls: Arc<RwLock<Vec<MockCall>>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockAiBackend {
    fn default() -> Self {
        Self::with_reply("SUMMARY: No changes needed\n```\n```")
    }
}

impl MockAiBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with the same text to every call.
    pub fn with_reply(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::with_responder(move |_, _| Ok(text.clone()))
    }

    /// Reply with whatever `responder(model, prompt)` returns.
    pub fn with_responder(responder: impl Fn(&str, &str) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            responder: Arc::new(responder),
            queued: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a reply for the next call to `model`.
    pub async fn queue(&self, model: impl Into<String>, reply: Reply) {
        self.queued.write().await.entry(model.into()).or_default().push_back(reply);
    }

    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.read().await.clone()
    }

    pub async fn calls_for(&self, model: &str) -> usize {
        self.calls.read().await.iter().filter(|c| c.model == model).count()
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiBackend for MockAiBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, model: &str, prompt: &str, _options: &GenerationOptions) -> Result<String, AiBackendError> {
        self.calls.write().await.push(MockCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let queued = self.queued.write().await.get_mut(model).and_then(VecDeque::pop_front);
        match queued {
            Some(reply) => reply,
            None => (self.responder)(model, prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_replies_take_precedence() {
        let backend = MockAiBackend::with_reply("default");
        backend.queue("a", Err(AiBackendError::EmptyResponse)).await;

        let options = GenerationOptions::default();
        assert_eq!(backend.generate("a", "p", &options).await, Err(AiBackendError::EmptyResponse));
        assert_eq!(backend.generate("a", "p", &options).await.unwrap(), "default");
        assert_eq!(backend.generate("b", "p", &options).await.unwrap(), "default");
        assert_eq!(backend.calls_for("a").await, 2);
        assert_eq!(backend.calls().await.len(), 3);
    }
}
