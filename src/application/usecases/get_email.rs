use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{errors::DomainError, models::EmailMessage, repositories::EmailRepository};

pub struct GetEmailUseCase {
    repo: Arc<dyn EmailRepository>,
}

impl GetEmailUseCase {
    pub fn new(repo: Arc<dyn EmailRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, email_id: Uuid) -> Result<EmailMessage, DomainError> {
        self.repo
            .get(email_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("email {email_id}")))
    }
}
