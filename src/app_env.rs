use secrecy::SecretString;
use std::env;
use thiserror::Error;

/// URL for accessing the PostgreSQL database (should contain the database name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// User the application logs into the database as
pub const DB_USER: &str = "DATABASE_USER";
/// Password for [DB_USER]
pub const DB_PASSWORD: &str = "DATABASE_PASSWORD";
/// Log level configuration for the application. For formatting info, see [tracing_subscriber's EnvFilter documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the {0} environment variable must be set")]
    Missing(&'static str),
}

/// Credentials used to open the session's database connection
#[derive(Debug)]
pub struct DbSettings {
    pub url: String,
    pub user: String,
    pub password: SecretString,
}

impl DbSettings {
    /// Reads [DB_URL], [DB_USER] and [DB_PASSWORD] from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        Ok(DbSettings {
            url: required(DB_URL)?,
            user: required(DB_USER)?,
            password: SecretString::from(required(DB_PASSWORD)?),
        })
    }
}
