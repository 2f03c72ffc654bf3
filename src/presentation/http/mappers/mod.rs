use crate::{
    domain::{
        models::{BodyFormat, EmailMessage},
        value_objects::RecipientList,
    },
    presentation::http::responses::EmailDto,
};

pub fn map_email(email: &EmailMessage) -> EmailDto {
    EmailDto {
        id: email.id,
        to: email.to.joined(),
        cc: email.cc.as_ref().map(RecipientList::joined),
        bcc: email.bcc.as_ref().map(RecipientList::joined),
        subject: email.content.subject.clone(),
        body: email.content.body.clone(),
        is_html: email.content.format == BodyFormat::Html,
        status: email.status.into(),
        created_at: email.created_at.to_rfc3339(),
        sent_at: email.sent_at.map(|sent_at| sent_at.to_rfc3339()),
        error_message: email.error_message.clone(),
        retry_count: email.retry_count,
    }
}
