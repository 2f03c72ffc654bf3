use async_trait::async_trait;

use crate::domain::models::EmailMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        DeliveryOutcome::Failed {
            reason: reason.into(),
        }
    }
}

/// Hands one message to a mail relay.
///
/// Implementations report every problem (bad address, connection, auth,
/// timeout) as [`DeliveryOutcome::Failed`]; nothing is propagated as an error.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> DeliveryOutcome;
}
