use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    application::services::delivery_queue::{DeliveryQueue, QueueError},
    domain::{models::EmailStatus, repositories::EmailRepository},
};

/// Re-enqueues every stored Pending email, oldest first.
///
/// Run once at startup, after the worker is consuming, so records accepted
/// before a restart are delivered. Emails left in Sending are not touched.
pub struct RequeuePendingUseCase {
    repo: Arc<dyn EmailRepository>,
    queue: Arc<DeliveryQueue>,
}

/// Pending ids read from the store, not yet handed to the queue.
///
/// Load it before accepting submissions so a new email is never queued both
/// by its submission and by recovery.
pub struct PendingBacklog {
    ids: Vec<Uuid>,
    queue: Arc<DeliveryQueue>,
}

impl RequeuePendingUseCase {
    pub fn new(repo: Arc<dyn EmailRepository>, queue: Arc<DeliveryQueue>) -> Self {
        Self { repo, queue }
    }

    pub async fn load(&self) -> anyhow::Result<PendingBacklog> {
        let ids = self
            .repo
            .find_by_status(EmailStatus::Pending)
            .await?
            .into_iter()
            .map(|email| email.id)
            .collect();
        Ok(PendingBacklog {
            ids,
            queue: self.queue.clone(),
        })
    }

    /// Returns how many ids were enqueued before finishing or being cancelled.
    pub async fn execute(&self, shutdown: &CancellationToken) -> anyhow::Result<usize> {
        Ok(self.load().await?.enqueue(shutdown).await?)
    }
}

impl PendingBacklog {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Waits for room as needed; stops early on cancellation.
    pub async fn enqueue(self, shutdown: &CancellationToken) -> Result<usize, QueueError> {
        let total = self.ids.len();
        let mut requeued = 0;

        for id in self.ids {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.queue.enqueue(id) => result?,
            }
            requeued += 1;
        }

        if requeued < total {
            tracing::warn!(requeued, total, "pending recovery interrupted by shutdown");
        } else {
            tracing::info!(requeued, "requeued pending emails from store");
        }
        Ok(requeued)
    }
}
