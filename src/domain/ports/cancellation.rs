use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::errors::DomainResult;

/// Out-of-band cancellation token keyed by job id.
///
/// Raised by `cancel`, polled by the run loop between batches and cleared
/// when the run exits. A raised signal lapses after its time-to-live.
#[async_trait]
pub trait CancellationSignal: Send + Sync {
    async fn raise(&self, job_id: Uuid, ttl: Duration) -> DomainResult<()>;

    async fn is_raised(&self, job_id: Uuid) -> DomainResult<bool>;

    async fn clear(&self, job_id: Uuid) -> DomainResult<()>;
}
