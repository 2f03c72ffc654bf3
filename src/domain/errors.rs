use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::EmailStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid status transition for email {id}: {from} -> {to}")]
    InvalidTransition {
        id: Uuid,
        from: EmailStatus,
        to: EmailStatus,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
