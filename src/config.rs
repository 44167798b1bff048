//! Store configuration from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `OASIS_DATA_DIR` | `./oasis-data` | Directory for the local JSON store |
//! | `OASIS_API_URL` | unset | Remote API base URL; unset means offline |
//! | `OASIS_API_TIMEOUT_SECS` | `10` | Per-request timeout for remote sync |
//! | `OASIS_SYNC_WAIT_SECS` | `15` | How long the CLI waits on a sync ticket |

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ErrorCode;

const DEFAULT_DATA_DIR: &str = "./oasis-data";
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("OASIS_DATA_DIR must not be empty")]
    EmptyDataDir,
    #[error("OASIS_API_URL must be an http(s) URL, got {0:?}")]
    InvalidApiUrl(String),
    #[error("OASIS_API_TIMEOUT_SECS must be positive")]
    ZeroTimeout,
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDataDir => "E_CONFIG_DATA_DIR",
            Self::InvalidApiUrl(_) => "E_CONFIG_API_URL",
            Self::ZeroTimeout => "E_CONFIG_TIMEOUT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    /// Base URL without trailing slash. `None` keeps every sync local.
    pub api_url: Option<String>,
    pub api_timeout: Duration,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup("OASIS_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_owned());
        if data_dir.trim().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }

        let api_url = match lookup("OASIS_API_URL").map(|v| v.trim().to_owned()) {
            None => None,
            Some(url) if url.is_empty() => None,
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                Some(url.trim_end_matches('/').to_owned())
            }
            Some(url) => return Err(ConfigError::InvalidApiUrl(url)),
        };

        let timeout_secs = parse_or(lookup("OASIS_API_TIMEOUT_SECS"), DEFAULT_API_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self { data_dir: PathBuf::from(data_dir), api_url, api_timeout: Duration::from_secs(timeout_secs) })
    }
}

/// Parse an environment variable, falling back to `default` when unset or unparsable.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    parse_or(std::env::var(key).ok(), default)
}

fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}
