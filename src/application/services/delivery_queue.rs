use std::num::NonZeroUsize;

use thiserror::Error;
use tokio::sync::{
    Mutex,
    mpsc::{self, error::TrySendError},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("delivery queue is full")]
    Full,
    #[error("delivery queue is closed")]
    Closed,
    #[error("dequeue cancelled by shutdown")]
    Cancelled,
}

/// Bounded FIFO of email ids waiting for a delivery attempt.
///
/// Any number of producers may enqueue concurrently; a single consumer
/// dequeues. The queue never de-duplicates, so the same id may appear more
/// than once when a message is requeued for retry.
pub struct DeliveryQueue {
    sender: mpsc::Sender<Uuid>,
    receiver: Mutex<mpsc::Receiver<Uuid>>,
    capacity: NonZeroUsize,
}

impl DeliveryQueue {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.get());
        Self {
            sender,
            receiver: Mutex::new(receiver),
            capacity,
        }
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Waits for a free slot when the queue is full.
    ///
    /// Cancel-safe: dropping the returned future before it completes leaves
    /// the queue untouched.
    pub async fn enqueue(&self, id: Uuid) -> Result<(), QueueError> {
        self.sender.send(id).await.map_err(|_| QueueError::Closed)?;
        tracing::info!(email_id = %id, "email enqueued for delivery");
        Ok(())
    }

    pub fn try_enqueue(&self, id: Uuid) -> Result<(), QueueError> {
        match self.sender.try_send(id) {
            Ok(()) => {
                tracing::info!(email_id = %id, "email enqueued for delivery");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(QueueError::Full),
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    /// Waits for the next id, or returns [`QueueError::Cancelled`] once
    /// `shutdown` fires.
    pub async fn dequeue(&self, shutdown: &CancellationToken) -> Result<Uuid, QueueError> {
        let mut receiver = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Err(QueueError::Cancelled),
            receiver = self.receiver.lock() => receiver,
        };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Err(QueueError::Cancelled),
            id = receiver.recv() => {
                let id = id.ok_or(QueueError::Closed)?;
                tracing::debug!(email_id = %id, "email dequeued for delivery");
                Ok(id)
            }
        }
    }

    /// Number of ids currently waiting.
    pub fn len(&self) -> usize {
        self.capacity.get() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
