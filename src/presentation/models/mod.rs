use poem_openapi::Enum;

use crate::domain::models::EmailStatus;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum EmailStatusDto {
    Pending,
    Sending,
    Sent,
    Failed,
}

impl From<EmailStatus> for EmailStatusDto {
    fn from(value: EmailStatus) -> Self {
        match value {
            EmailStatus::Pending => EmailStatusDto::Pending,
            EmailStatus::Sending => EmailStatusDto::Sending,
            EmailStatus::Sent => EmailStatusDto::Sent,
            EmailStatus::Failed => EmailStatusDto::Failed,
        }
    }
}
