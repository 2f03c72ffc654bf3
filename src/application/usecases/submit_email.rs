use std::sync::Arc;

use uuid::Uuid;

use crate::{
    application::services::delivery_queue::DeliveryQueue,
    domain::{
        errors::DomainError,
        models::{BodyFormat, EmailStatus, NewEmail},
        repositories::EmailRepository,
    },
};

pub struct SubmitEmailUseCase {
    repo: Arc<dyn EmailRepository>,
    queue: Arc<DeliveryQueue>,
}

pub struct SubmitEmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub cc: Option<String>,
    pub bcc: Option<String>,
}

#[derive(Debug)]
pub struct SubmitEmailResponse {
    pub email_id: Uuid,
    pub status: EmailStatus,
}

impl SubmitEmailUseCase {
    pub fn new(repo: Arc<dyn EmailRepository>, queue: Arc<DeliveryQueue>) -> Self {
        Self { repo, queue }
    }

    /// Stores the request as Pending and hands its id to the delivery queue.
    /// Waits while the queue is full.
    pub async fn execute(
        &self,
        request: SubmitEmailRequest,
    ) -> Result<SubmitEmailResponse, DomainError> {
        let format = if request.is_html {
            BodyFormat::Html
        } else {
            BodyFormat::PlainText
        };
        let email = NewEmail::new(
            &request.to,
            &request.subject,
            &request.body,
            format,
            request.cc.as_deref(),
            request.bcc.as_deref(),
        )?;

        let stored = self.repo.insert(email).await?;
        tracing::info!(email_id = %stored.id, to = %stored.to.joined(), "email accepted");

        self.queue
            .enqueue(stored.id)
            .await
            .map_err(anyhow::Error::from)?;

        Ok(SubmitEmailResponse {
            email_id: stored.id,
            status: stored.status,
        })
    }
}
