//! In-memory cancellation signals for single-process use and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::ports::CancellationSignal;

#[derive(Debug, Clone, Default)]
pub struct InMemoryCancellationSignal {
    deadlines: Arc<RwLock<HashMap<Uuid, Instant>>>,
}

impl InMemoryCancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored signals, expired or not.
    pub async fn len(&self) -> usize {
        self.deadlines.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CancellationSignal for InMemoryCancellationSignal {
    async fn raise(&self, job_id: Uuid, ttl: Duration) -> DomainResult<()> {
        let now = Instant::now();
        let mut deadlines = self.deadlines.write().await;
        deadlines.retain(|_, deadline| *deadline > now);
        deadlines.insert(job_id, now + ttl);
        Ok(())
    }

    async fn is_raised(&self, job_id: Uuid) -> DomainResult<bool> {
        let deadlines = self.deadlines.read().await;
        Ok(deadlines.get(&job_id).is_some_and(|deadline| *deadline > Instant::now()))
    }

    async fn clear(&self, job_id: Uuid) -> DomainResult<()> {
        self.deadlines.write().await.remove(&job_id);
        Ok(())
    }
}
