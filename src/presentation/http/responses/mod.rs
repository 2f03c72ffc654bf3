use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::EmailStatusDto;

#[derive(Object)]
pub struct SendEmailResponseDto {
    pub id: Uuid,
    pub message: String,
    pub status: EmailStatusDto,
}

#[derive(Object)]
pub struct EmailDto {
    pub id: Uuid,
    pub to: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub status: EmailStatusDto,
    pub created_at: String,
    pub sent_at: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: u32,
}
