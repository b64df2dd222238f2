use log::{info, warn};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use thiserror::Error;

pub const DEFAULT_PORT: &str = "5000";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} is not defined in environment variables")]
    Missing(&'static str),

    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Process configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub upload_dir: PathBuf,
}

impl Config {
    /// Load from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key lookup
    ///
    /// # Errors
    /// * `ConfigError::Missing` when `DATABASE_URL` is absent or blank
    /// * `ConfigError::Invalid` when `PORT` does not parse
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            port: try_load(&lookup, "PORT", DEFAULT_PORT)?,
            database_url,
            upload_dir: try_load(&lookup, "UPLOAD_DIR", DEFAULT_UPLOAD_DIR)?,
        })
    }

    pub fn address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                message: e.to_string(),
            }
        })
}
