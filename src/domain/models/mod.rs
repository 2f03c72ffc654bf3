pub mod email;

pub use email::{BodyFormat, EmailContent, EmailMessage, EmailStatus, NewEmail, RetryDecision};
