use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::{EmailMessage, EmailStatus, NewEmail};

/// Durable store for email records.
///
/// Listings are returned in creation order. Updates are full replacements
/// keyed by id and must be visible to the next read from the same caller.
#[async_trait]
pub trait EmailRepository: Send + Sync {
    async fn insert(&self, email: NewEmail) -> anyhow::Result<EmailMessage>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<EmailMessage>>;

    async fn update(&self, email: &EmailMessage) -> anyhow::Result<()>;

    async fn find_by_status(&self, status: EmailStatus) -> anyhow::Result<Vec<EmailMessage>>;

    async fn list_all(&self) -> anyhow::Result<Vec<EmailMessage>>;
}
