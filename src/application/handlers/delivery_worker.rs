use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    application::services::{
        delivery_queue::{DeliveryQueue, QueueError},
        transport::{DeliveryOutcome, MailTransport},
    },
    domain::{
        models::{EmailStatus, RetryDecision},
        repositories::EmailRepository,
    },
};

#[derive(Debug, Clone)]
pub struct DeliveryWorkerConfig {
    pub max_retries: u32,
    /// Pause after an iteration fails unexpectedly.
    pub error_cooldown: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Missing,
    NotPending(EmailStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Sent,
    Requeued { retry_count: u32 },
    Failed { retry_count: u32 },
    Skipped(SkipReason),
}

/// The single consumer of the delivery queue.
///
/// Each dequeued id runs through Pending -> Sending -> Sent | Pending | Failed,
/// with every transition persisted before the next step.
pub struct DeliveryWorker {
    repo: Arc<dyn EmailRepository>,
    transport: Arc<dyn MailTransport>,
    queue: Arc<DeliveryQueue>,
    config: DeliveryWorkerConfig,
}

impl DeliveryWorker {
    pub fn new(
        repo: Arc<dyn EmailRepository>,
        transport: Arc<dyn MailTransport>,
        queue: Arc<DeliveryQueue>,
        config: DeliveryWorkerConfig,
    ) -> Self {
        Self {
            repo,
            transport,
            queue,
            config,
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Runs until `shutdown` is cancelled. An item already dequeued is always
    /// finished before the loop exits.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            max_retries = self.config.max_retries,
            queue_capacity = self.queue.capacity().get(),
            "delivery worker starting"
        );

        loop {
            let id = match self.queue.dequeue(&shutdown).await {
                Ok(id) => id,
                Err(QueueError::Cancelled) => break,
                Err(err) => {
                    error!(error = %err, "failed to dequeue email");
                    if !self.cool_down(&shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            match self.process(id, &shutdown).await {
                Ok(outcome) => debug!(email_id = %id, ?outcome, "email processed"),
                Err(err) => {
                    error!(email_id = %id, error = %format!("{err:#}"), "error processing email");
                    if !self.cool_down(&shutdown).await {
                        break;
                    }
                }
            }
        }

        info!("delivery worker stopped");
    }

    /// Runs one delivery attempt for `id`.
    pub async fn process(
        &self,
        id: Uuid,
        shutdown: &CancellationToken,
    ) -> anyhow::Result<ProcessOutcome> {
        let Some(mut email) = self.repo.get(id).await? else {
            warn!(email_id = %id, "email not found in store, skipping");
            return Ok(ProcessOutcome::Skipped(SkipReason::Missing));
        };

        if email.status != EmailStatus::Pending {
            warn!(email_id = %id, status = %email.status, "email is not pending, skipping");
            return Ok(ProcessOutcome::Skipped(SkipReason::NotPending(email.status)));
        }

        email.begin_sending()?;
        email.updated_at = Utc::now();
        self.repo.update(&email).await?;

        match self.transport.send(&email).await {
            DeliveryOutcome::Delivered => {
                let now = Utc::now();
                email.mark_sent(now)?;
                email.updated_at = now;
                self.repo.update(&email).await?;
                info!(email_id = %id, retry_count = email.retry_count, "email sent");
                Ok(ProcessOutcome::Sent)
            }
            DeliveryOutcome::Failed { reason } => {
                let decision = email.record_failure(&reason, self.config.max_retries)?;
                email.updated_at = Utc::now();
                self.repo.update(&email).await?;

                match decision {
                    RetryDecision::GiveUp => {
                        error!(
                            email_id = %id,
                            retry_count = email.retry_count,
                            reason = %reason,
                            "email delivery failed permanently"
                        );
                        Ok(ProcessOutcome::Failed {
                            retry_count: email.retry_count,
                        })
                    }
                    RetryDecision::Retry => {
                        warn!(
                            email_id = %id,
                            retry_count = email.retry_count,
                            max_retries = self.config.max_retries,
                            reason = %reason,
                            "email delivery failed, will retry"
                        );
                        self.requeue(id, shutdown)?;
                        Ok(ProcessOutcome::Requeued {
                            retry_count: email.retry_count,
                        })
                    }
                }
            }
        }
    }

    /// Puts `id` back at the tail without blocking the only consumer on its
    /// own full queue.
    fn requeue(&self, id: Uuid, shutdown: &CancellationToken) -> Result<(), QueueError> {
        match self.queue.try_enqueue(id) {
            Err(QueueError::Full) => {
                warn!(email_id = %id, "delivery queue full, deferring requeue");
                let queue = self.queue.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            warn!(email_id = %id, "shutdown before requeue, email stays pending");
                        }
                        result = queue.enqueue(id) => {
                            if let Err(err) = result {
                                error!(email_id = %id, error = %err, "deferred requeue failed");
                            }
                        }
                    }
                });
                Ok(())
            }
            other => other,
        }
    }

    async fn cool_down(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.config.error_cooldown) => true,
        }
    }
}
