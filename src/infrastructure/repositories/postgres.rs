use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::domain::{
    models::{BodyFormat, EmailContent, EmailMessage, EmailStatus, NewEmail},
    repositories::EmailRepository,
    value_objects::RecipientList,
};

pub type PgPool = Pool<Postgres>;

/// Opens a pool and applies the embedded migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct PostgresEmailRepository {
    pool: PgPool,
}

impl PostgresEmailRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, to_addrs, cc_addrs, bcc_addrs, subject, body, body_format, status,
           created_at, updated_at, sent_at, error_message, retry_count
    FROM emails
"#;

#[async_trait]
impl EmailRepository for PostgresEmailRepository {
    async fn insert(&self, email: NewEmail) -> anyhow::Result<EmailMessage> {
        let entry = EmailMessage::pending(Uuid::new_v4(), email, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO emails (
                id, to_addrs, cc_addrs, bcc_addrs, subject, body, body_format, status,
                created_at, updated_at, sent_at, error_message, retry_count
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
            "#,
        )
        .bind(entry.id)
        .bind(entry.to.joined())
        .bind(entry.cc.as_ref().map(RecipientList::joined))
        .bind(entry.bcc.as_ref().map(RecipientList::joined))
        .bind(&entry.content.subject)
        .bind(&entry.content.body)
        .bind(body_format_to_str(entry.content.format))
        .bind(entry.status.as_str())
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .bind(entry.sent_at)
        .bind(&entry.error_message)
        .bind(entry.retry_count as i32)
        .execute(&self.pool)
        .await?;

        tracing::debug!(email_id = %entry.id, "email inserted");
        Ok(entry)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<EmailMessage>> {
        let record = sqlx::query_as::<_, EmailRecord>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        record.map(EmailMessage::try_from).transpose()
    }

    async fn update(&self, email: &EmailMessage) -> anyhow::Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE emails
            SET to_addrs = $2,
                cc_addrs = $3,
                bcc_addrs = $4,
                subject = $5,
                body = $6,
                body_format = $7,
                status = $8,
                updated_at = $9,
                sent_at = $10,
                error_message = $11,
                retry_count = $12
            WHERE id = $1
            "#,
        )
        .bind(email.id)
        .bind(email.to.joined())
        .bind(email.cc.as_ref().map(RecipientList::joined))
        .bind(email.bcc.as_ref().map(RecipientList::joined))
        .bind(&email.content.subject)
        .bind(&email.content.body)
        .bind(body_format_to_str(email.content.format))
        .bind(email.status.as_str())
        .bind(email.updated_at)
        .bind(email.sent_at)
        .bind(&email.error_message)
        .bind(email.retry_count as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("email {} not found", email.id);
        }
        tracing::debug!(email_id = %email.id, status = %email.status, "email updated");
        Ok(())
    }

    async fn find_by_status(&self, status: EmailStatus) -> anyhow::Result<Vec<EmailMessage>> {
        let rows = sqlx::query_as::<_, EmailRecord>(&format!(
            "{SELECT_COLUMNS} WHERE status = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(EmailMessage::try_from).collect()
    }

    async fn list_all(&self) -> anyhow::Result<Vec<EmailMessage>> {
        let rows = sqlx::query_as::<_, EmailRecord>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(EmailMessage::try_from).collect()
    }
}

#[derive(FromRow)]
struct EmailRecord {
    id: Uuid,
    to_addrs: String,
    cc_addrs: Option<String>,
    bcc_addrs: Option<String>,
    subject: String,
    body: String,
    body_format: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    retry_count: i32,
}

impl TryFrom<EmailRecord> for EmailMessage {
    type Error = anyhow::Error;

    fn try_from(value: EmailRecord) -> Result<Self, Self::Error> {
        let status = EmailStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown email status {}", value.status))?;
        let retry_count = u32::try_from(value.retry_count)
            .map_err(|_| anyhow::anyhow!("negative retry count for email {}", value.id))?;

        Ok(Self {
            id: value.id,
            to: RecipientList::parse(&value.to_addrs)?,
            cc: RecipientList::parse_optional(value.cc_addrs.as_deref()),
            bcc: RecipientList::parse_optional(value.bcc_addrs.as_deref()),
            content: EmailContent {
                subject: value.subject,
                body: value.body,
                format: str_to_body_format(&value.body_format)?,
            },
            status,
            created_at: value.created_at,
            updated_at: value.updated_at,
            sent_at: value.sent_at,
            error_message: value.error_message,
            retry_count,
        })
    }
}

fn body_format_to_str(format: BodyFormat) -> &'static str {
    match format {
        BodyFormat::PlainText => "plain_text",
        BodyFormat::Html => "html",
    }
}

fn str_to_body_format(value: &str) -> anyhow::Result<BodyFormat> {
    match value {
        "plain_text" => Ok(BodyFormat::PlainText),
        "html" => Ok(BodyFormat::Html),
        other => anyhow::bail!("unknown body format {other}"),
    }
}
