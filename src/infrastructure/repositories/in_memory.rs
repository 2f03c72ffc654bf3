use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    models::{EmailMessage, EmailStatus, NewEmail},
    repositories::EmailRepository,
};

#[derive(Default)]
struct Emails {
    by_id: HashMap<Uuid, EmailMessage>,
    order: Vec<Uuid>,
}

impl Emails {
    fn ordered(&self) -> impl Iterator<Item = &EmailMessage> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

#[derive(Default)]
pub struct InMemoryEmailRepository {
    emails: Arc<RwLock<Emails>>,
}

impl InMemoryEmailRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmailRepository for InMemoryEmailRepository {
    async fn insert(&self, email: NewEmail) -> anyhow::Result<EmailMessage> {
        let entry = EmailMessage::pending(Uuid::new_v4(), email, Utc::now());
        let mut emails = self.emails.write().await;
        emails.order.push(entry.id);
        emails.by_id.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<EmailMessage>> {
        let emails = self.emails.read().await;
        Ok(emails.by_id.get(&id).cloned())
    }

    async fn update(&self, email: &EmailMessage) -> anyhow::Result<()> {
        let mut emails = self.emails.write().await;
        match emails.by_id.get_mut(&email.id) {
            Some(entry) => {
                *entry = email.clone();
                Ok(())
            }
            None => anyhow::bail!("email {} not found", email.id),
        }
    }

    async fn find_by_status(&self, status: EmailStatus) -> anyhow::Result<Vec<EmailMessage>> {
        let emails = self.emails.read().await;
        Ok(emails
            .ordered()
            .filter(|email| email.status == status)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<EmailMessage>> {
        let emails = self.emails.read().await;
        Ok(emails.ordered().cloned().collect())
    }
}
