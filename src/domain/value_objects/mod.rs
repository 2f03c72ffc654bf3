use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Semicolon-delimited set of mailbox addresses, e.g. `"a@x.io; b@y.io"`.
///
/// Entries are trimmed and blanks are dropped, so a parsed list is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientList(Vec<String>);

impl RecipientList {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let addresses: Vec<String> = raw
            .split(';')
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(str::to_string)
            .collect();

        if addresses.is_empty() {
            return Err(DomainError::Validation(
                "at least one recipient address is required".to_string(),
            ));
        }

        Ok(Self(addresses))
    }

    /// Optional lists (cc, bcc) treat a missing or blank value as absent.
    pub fn parse_optional(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| Self::parse(value).ok())
    }

    pub fn addresses(&self) -> &[String] {
        &self.0
    }

    pub fn joined(&self) -> String {
        self.0.join("; ")
    }
}
