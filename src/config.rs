//! Runtime configuration.
//!
//! Every setting comes from the environment, with the defaults below used
//! when a variable is unset.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_DB_PATH: &str = ".labbook_db";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "labbook=info,tower_http=info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LABBOOK_API_URL is not a valid URL: {0}")]
    ApiUrl(#[from] url::ParseError),
    #[error("LABBOOK_BIND is not a socket address: {0}")]
    Bind(String),
    #[error("LABBOOK_API_TIMEOUT must be a whole number of seconds: {0}")]
    Timeout(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub api_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("LABBOOK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(api_url.trim())?;

        let bind_raw = lookup("LABBOOK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Bind(bind_raw.clone()))?;

        let db_path = lookup("LABBOOK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let api_timeout = match lookup("LABBOOK_API_TIMEOUT") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Timeout(raw.clone()))?,
            None => Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            bind,
            db_path,
            api_timeout,
        })
    }
}
