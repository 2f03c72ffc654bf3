use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{errors::DomainError, value_objects::RecipientList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailStatus {
    Pending,
    Sending,
    Sent,
    Failed,
}

impl EmailStatus {
    /// Sent and Failed never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EmailStatus::Sent | EmailStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Pending => "pending",
            EmailStatus::Sending => "sending",
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(EmailStatus::Pending),
            "sending" => Some(EmailStatus::Sending),
            "sent" => Some(EmailStatus::Sent),
            "failed" => Some(EmailStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EmailStatus::Pending => "Pending",
            EmailStatus::Sending => "Sending",
            EmailStatus::Sent => "Sent",
            EmailStatus::Failed => "Failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyFormat {
    PlainText,
    Html,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
    pub format: BodyFormat,
}

/// A validated send request that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewEmail {
    pub to: RecipientList,
    pub cc: Option<RecipientList>,
    pub bcc: Option<RecipientList>,
    pub content: EmailContent,
}

impl NewEmail {
    pub fn new(
        to: &str,
        subject: &str,
        body: &str,
        format: BodyFormat,
        cc: Option<&str>,
        bcc: Option<&str>,
    ) -> Result<Self, DomainError> {
        if to.trim().is_empty() {
            return Err(DomainError::Validation("To address is required".to_string()));
        }
        if subject.trim().is_empty() {
            return Err(DomainError::Validation("Subject is required".to_string()));
        }
        if body.trim().is_empty() {
            return Err(DomainError::Validation("Body is required".to_string()));
        }

        Ok(Self {
            to: RecipientList::parse(to)?,
            cc: RecipientList::parse_optional(cc),
            bcc: RecipientList::parse_optional(bcc),
            content: EmailContent {
                subject: subject.to_string(),
                body: body.to_string(),
                format,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    GiveUp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: Uuid,
    pub to: RecipientList,
    pub cc: Option<RecipientList>,
    pub bcc: Option<RecipientList>,
    pub content: EmailContent,
    pub status: EmailStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub retry_count: u32,
}

impl EmailMessage {
    /// Builds the stored form of a freshly accepted request.
    pub fn pending(id: Uuid, email: NewEmail, now: DateTime<Utc>) -> Self {
        Self {
            id,
            to: email.to,
            cc: email.cc,
            bcc: email.bcc,
            content: email.content,
            status: EmailStatus::Pending,
            created_at: now,
            updated_at: now,
            sent_at: None,
            error_message: None,
            retry_count: 0,
        }
    }

    pub fn begin_sending(&mut self) -> Result<(), DomainError> {
        self.ensure_status(EmailStatus::Pending, EmailStatus::Sending)?;
        self.status = EmailStatus::Sending;
        Ok(())
    }

    pub fn mark_sent(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_status(EmailStatus::Sending, EmailStatus::Sent)?;
        self.status = EmailStatus::Sent;
        self.sent_at = Some(now);
        self.error_message = None;
        Ok(())
    }

    /// Counts a failed attempt and moves the message back to Pending, or to
    /// Failed once `max_retries` attempts have failed.
    pub fn record_failure(
        &mut self,
        reason: &str,
        max_retries: u32,
    ) -> Result<RetryDecision, DomainError> {
        let target = if self.retry_count + 1 >= max_retries {
            EmailStatus::Failed
        } else {
            EmailStatus::Pending
        };
        self.ensure_status(EmailStatus::Sending, target)?;

        self.retry_count += 1;
        self.status = target;
        if target == EmailStatus::Failed {
            self.error_message = Some(format!(
                "failed after {} attempts: {reason}",
                self.retry_count
            ));
            Ok(RetryDecision::GiveUp)
        } else {
            self.error_message = Some(reason.to_string());
            Ok(RetryDecision::Retry)
        }
    }

    fn ensure_status(&self, expected: EmailStatus, to: EmailStatus) -> Result<(), DomainError> {
        if self.status != expected {
            return Err(DomainError::InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        Ok(())
    }
}
