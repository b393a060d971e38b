//! Configuration management for the sync daemon.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use pawsync_engine::{EvictionPolicy, SyncConfig};

/// Daemon configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote API
    pub api_url: String,
    /// SQLite URL for the local store
    pub database_url: String,
    /// Path polled by the connectivity probe, relative to `api_url`
    pub health_path: String,
    pub probe_interval: Duration,
    pub request_timeout: Duration,
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("API_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://pawsync.db".to_string());
        let health_path = lookup("HEALTH_PATH").unwrap_or_else(|| "/health".to_string());

        let probe_interval = Duration::from_secs(parse(&lookup, "PROBE_INTERVAL_SECS", 15)?);
        let request_timeout = Duration::from_secs(parse(&lookup, "REQUEST_TIMEOUT_SECS", 30)?);

        let defaults = SyncConfig::default();
        let eviction = match lookup("EVICTION").as_deref() {
            None | Some("oldest") => EvictionPolicy::Oldest,
            Some("status-aware") => EvictionPolicy::StatusAware,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "EVICTION",
                    value: other.to_string(),
                })
            }
        };

        let sync = SyncConfig {
            sync_interval_ms: parse(&lookup, "SYNC_INTERVAL_SECS", defaults.sync_interval_ms / 1000)?
                .saturating_mul(1000),
            max_retries: parse(&lookup, "MAX_RETRIES", defaults.max_retries)?,
            base_delay_ms: parse(&lookup, "RETRY_BASE_DELAY_MS", defaults.base_delay_ms)?,
            batch_size: parse(&lookup, "BATCH_SIZE", defaults.batch_size)?,
            max_queue_size: parse(&lookup, "MAX_QUEUE_SIZE", defaults.max_queue_size)?,
            retry_client_errors: parse(
                &lookup,
                "RETRY_CLIENT_ERRORS",
                defaults.retry_client_errors,
            )?,
            eviction,
            ..defaults
        };

        sync.validate()
            .map_err(|e| ConfigError::InvalidSync(e.to_string()))?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            database_url,
            health_path,
            probe_interval,
            request_timeout,
            sync,
        })
    }

    /// Full URL of the health endpoint.
    pub fn health_url(&self) -> String {
        format!("{}{}", self.api_url, self.health_path)
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name,
            value,
        }),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API_URL environment variable is required")]
    MissingApiUrl,

    #[error("Invalid {name} value: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid sync settings: {0}")]
    InvalidSync(String),
}
