use poem::{Error as PoemError, Result as PoemResult, http::StatusCode};
use poem_openapi::SecurityScheme;
use poem_openapi::auth::ApiKey;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Shared-secret header required on every email operation. A missing header
/// is rejected by the scheme itself.
#[derive(SecurityScheme)]
#[oai(ty = "api_key", key_name = "X-API-Key", key_in = "header")]
pub struct ApiKeyAuth(pub ApiKey);

impl ApiKeyAuth {
    pub fn verify(&self, expected: &str) -> PoemResult<()> {
        if self.0.key != expected {
            tracing::warn!("invalid api key presented");
            return Err(PoemError::from_string(
                "Invalid API key",
                StatusCode::UNAUTHORIZED,
            ));
        }
        Ok(())
    }
}
