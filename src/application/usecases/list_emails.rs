use std::sync::Arc;

use crate::domain::{
    models::{EmailMessage, EmailStatus},
    repositories::EmailRepository,
};

pub struct ListEmailsUseCase {
    repo: Arc<dyn EmailRepository>,
}

impl ListEmailsUseCase {
    pub fn new(repo: Arc<dyn EmailRepository>) -> Self {
        Self { repo }
    }

    /// All emails, or only those currently in `status`.
    pub async fn execute(&self, status: Option<EmailStatus>) -> anyhow::Result<Vec<EmailMessage>> {
        match status {
            Some(status) => self.repo.find_by_status(status).await,
            None => self.repo.list_all().await,
        }
    }
}
