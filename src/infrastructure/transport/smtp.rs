use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::{
    application::services::transport::{DeliveryOutcome, MailTransport},
    domain::models::{BodyFormat, EmailMessage},
};

const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: Option<String>,
    pub enable_ssl: bool,
    pub timeout: Duration,
}

pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(settings: &SmtpSettings) -> anyhow::Result<Self> {
        let from_address: Address = settings.from_email.parse()?;
        let from = Mailbox::new(settings.from_name.clone(), from_address);

        let builder = match (settings.enable_ssl, settings.port) {
            (true, IMPLICIT_TLS_PORT) => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?,
            (true, _) => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?,
            (false, _) => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host),
        };
        let mut builder = builder
            .port(settings.port)
            .timeout(Some(settings.timeout));

        if !settings.username.is_empty() {
            // copied app passwords often contain spaces
            let password: String = settings
                .password
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            builder = builder.credentials(Credentials::new(settings.username.clone(), password));
        }

        tracing::info!(
            host = %settings.host,
            port = settings.port,
            ssl = settings.enable_ssl,
            "smtp transport configured"
        );

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }

    fn build_message(&self, email: &EmailMessage) -> anyhow::Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.content.subject.clone());

        for address in email.to.addresses() {
            builder = builder.to(address.parse::<Mailbox>()?);
        }
        for address in email.cc.iter().flat_map(|list| list.addresses()) {
            builder = builder.cc(address.parse::<Mailbox>()?);
        }
        for address in email.bcc.iter().flat_map(|list| list.addresses()) {
            builder = builder.bcc(address.parse::<Mailbox>()?);
        }

        let content_type = match email.content.format {
            BodyFormat::Html => ContentType::TEXT_HTML,
            BodyFormat::PlainText => ContentType::TEXT_PLAIN,
        };

        Ok(builder
            .header(content_type)
            .body(email.content.body.clone())?)
    }

    async fn try_send(&self, email: &EmailMessage) -> anyhow::Result<()> {
        let message = self.build_message(email)?;
        self.mailer.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &EmailMessage) -> DeliveryOutcome {
        tracing::info!(email_id = %email.id, to = %email.to.joined(), "attempting smtp delivery");

        match self.try_send(email).await {
            Ok(()) => {
                tracing::info!(email_id = %email.id, "smtp relay accepted email");
                DeliveryOutcome::Delivered
            }
            Err(err) => {
                let reason = format!("{err:#}");
                tracing::error!(email_id = %email.id, error = %reason, "smtp delivery failed");
                DeliveryOutcome::failed(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::models::NewEmail;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "localhost".to_string(),
            port: 2525,
            username: String::new(),
            password: String::new(),
            from_email: "noreply@example.com".to_string(),
            from_name: Some("Dispatch".to_string()),
            enable_ssl: false,
            timeout: Duration::from_secs(1),
        }
    }

    fn email(to: &str, format: BodyFormat) -> EmailMessage {
        let new = NewEmail::new(
            to,
            "Hi",
            "<p>Hello</p>",
            format,
            Some("carol@example.com"),
            Some("dave@example.com"),
        )
        .unwrap();
        EmailMessage::pending(Uuid::new_v4(), new, Utc::now())
    }

    #[tokio::test]
    async fn rejects_invalid_sender_address() {
        let mut settings = settings();
        settings.from_email = "not an address".to_string();
        assert!(SmtpMailTransport::new(&settings).is_err());
    }

    #[tokio::test]
    async fn builds_envelope_from_all_recipient_lists() {
        let transport = SmtpMailTransport::new(&settings()).unwrap();
        let message = transport
            .build_message(&email("alice@example.com; bob@example.com", BodyFormat::Html))
            .unwrap();

        assert_eq!(message.envelope().to().len(), 4);
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("Subject: Hi"));
        assert!(formatted.contains("text/html"));
    }

    #[tokio::test]
    async fn plain_text_body_uses_plain_content_type() {
        let transport = SmtpMailTransport::new(&settings()).unwrap();
        let message = transport
            .build_message(&email("alice@example.com", BodyFormat::PlainText))
            .unwrap();

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("text/plain"));
    }

    #[tokio::test]
    async fn malformed_recipient_is_reported_as_failure() {
        let transport = SmtpMailTransport::new(&settings()).unwrap();
        let outcome = transport.send(&email("not-an-address", BodyFormat::Html)).await;

        assert!(matches!(outcome, DeliveryOutcome::Failed { .. }));
    }
}
