use std::sync::Arc;

use poem::{Result as PoemResult, http::StatusCode};
use poem_openapi::{OpenApi, param::Path, payload::Json};
use uuid::Uuid;

use crate::{
    application::usecases::submit_email::SubmitEmailRequest,
    domain::{errors::DomainError, models::EmailStatus},
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::map_email,
        requests::SendEmailRequestDto,
        responses::{EmailDto, SendEmailResponseDto},
        security::ApiKeyAuth,
    },
};

#[derive(Clone)]
pub struct EmailsEndpoints {
    state: Arc<ApiState>,
}

impl EmailsEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl EmailsEndpoints {
    /// Queue an email to be sent via SMTP
    #[oai(path = "/email/send", method = "post", tag = EndpointsTags::Email)]
    pub async fn send_email(
        &self,
        auth: ApiKeyAuth,
        request: Json<SendEmailRequestDto>,
    ) -> PoemResult<Json<SendEmailResponseDto>> {
        auth.verify(&self.state.api_key)?;
        let request = request.0;
        tracing::info!(to = %request.to, subject = %request.subject, "received email request");

        let response = self
            .state
            .submit_email_usecase
            .execute(SubmitEmailRequest {
                to: request.to,
                subject: request.subject,
                body: request.body,
                is_html: request.is_html,
                cc: request.cc,
                bcc: request.bcc,
            })
            .await
            .map_err(domain_error)?;

        Ok(Json(SendEmailResponseDto {
            id: response.email_id,
            message: "Email queued successfully".to_string(),
            status: response.status.into(),
        }))
    }

    /// Get all emails
    #[oai(path = "/email", method = "get", tag = EndpointsTags::Email)]
    pub async fn list_emails(&self, auth: ApiKeyAuth) -> PoemResult<Json<Vec<EmailDto>>> {
        auth.verify(&self.state.api_key)?;
        let emails = self
            .state
            .list_emails_usecase
            .execute(None)
            .await
            .map_err(internal_error)?;
        Ok(Json(emails.iter().map(map_email).collect()))
    }

    /// Get all pending emails
    #[oai(path = "/email/pending", method = "get", tag = EndpointsTags::Email)]
    pub async fn list_pending_emails(&self, auth: ApiKeyAuth) -> PoemResult<Json<Vec<EmailDto>>> {
        auth.verify(&self.state.api_key)?;
        let emails = self
            .state
            .list_emails_usecase
            .execute(Some(EmailStatus::Pending))
            .await
            .map_err(internal_error)?;
        Ok(Json(emails.iter().map(map_email).collect()))
    }

    /// Get email status by ID
    #[oai(path = "/email/:id", method = "get", tag = EndpointsTags::Email)]
    pub async fn get_email(&self, auth: ApiKeyAuth, id: Path<Uuid>) -> PoemResult<Json<EmailDto>> {
        auth.verify(&self.state.api_key)?;
        let email = self
            .state
            .get_email_usecase
            .execute(id.0)
            .await
            .map_err(domain_error)?;
        Ok(Json(map_email(&email)))
    }
}

fn domain_error(err: DomainError) -> poem::Error {
    match err {
        DomainError::Validation(reason) => {
            tracing::warn!(%reason, "email request validation failed");
            poem::Error::from_string(reason, StatusCode::BAD_REQUEST)
        }
        DomainError::NotFound(_) => poem::Error::from_string("Email not found", StatusCode::NOT_FOUND),
        other => internal_error(other.into()),
    }
}

fn internal_error(err: anyhow::Error) -> poem::Error {
    tracing::error!(error = %format!("{err:#}"), "email api request failed");
    poem::Error::from_string(
        "An error occurred while processing the request",
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}
