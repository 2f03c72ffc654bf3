pub mod get_email;
pub mod list_emails;
pub mod requeue_pending;
pub mod submit_email;
