use std::{env::var, num::NonZeroUsize, str::FromStr, time::Duration};

use dotenvy::dotenv;
use thiserror::Error;

use crate::infrastructure::transport::smtp::SmtpSettings;

const DEFAULT_QUEUE_CAPACITY: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env param {0}")]
    Missing(&'static str),
    #[error("invalid value for env param {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub api_key: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub max_retries: u32,
    pub queue_capacity: NonZeroUsize,
    pub worker_error_cooldown: Duration,
    pub log_level: String,
    pub smtp: SmtpSettings,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn try_parse() -> Result<Config, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let max_retries: u32 = env.parse_or("MAX_RETRIES", 3)?;
        if max_retries == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_RETRIES",
                reason: "must be a positive integer".to_string(),
            });
        }

        Ok(Config {
            port: env.parse_required("PORT")?,
            scheme: env.string_or("SCHEME", "http"),
            host: env.string_or("HOST", "localhost"),
            api_key: env.required("API_KEY")?,
            database_url: env.optional("DATABASE_URL"),
            database_max_connections: env.parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            max_retries,
            queue_capacity: env.parse_or("QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?,
            worker_error_cooldown: Duration::from_secs(
                env.parse_or("WORKER_ERROR_COOLDOWN_SECONDS", 5)?,
            ),
            log_level: env.string_or("LOG_LEVEL", "info"),
            smtp: SmtpSettings {
                host: env.required("SMTP_HOST")?,
                port: env.parse_or("SMTP_PORT", 587)?,
                username: env.string_or("SMTP_USERNAME", ""),
                password: env.string_or("SMTP_PASSWORD", ""),
                from_email: env.required("SMTP_FROM_EMAIL")?,
                from_name: env.optional("SMTP_FROM_NAME"),
                enable_ssl: env.parse_or("SMTP_ENABLE_SSL", true)?,
                timeout: Duration::from_secs(env.parse_or("SMTP_TIMEOUT_SECONDS", 30)?),
            },
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_required<T>(&self, key: &'static str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        parse_value(key, &self.required(key)?)
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(value) => parse_value(key, &value),
            None => Ok(default),
        }
    }
}

fn parse_value<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|err| ConfigError::Invalid {
        key,
        reason: err.to_string(),
    })
}
