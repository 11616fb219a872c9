//! Application-level configuration loading: store deadlines, id allocation and pool sizing.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::services::game_service::{
    DEFAULT_ALLOCATION_ATTEMPTS, DEFAULT_STORE_TIMEOUT, LifecycleSettings,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CHESS_LIVE_BACK_CONFIG_PATH";
/// Upper bound of pooled MongoDB connections when not configured.
const DEFAULT_MONGO_MAX_POOL_SIZE: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Deadline for every store call.
    pub store_timeout: Duration,
    /// Insert attempts before id allocation fails.
    pub allocation_attempts: u32,
    /// Upper bound of the MongoDB connection pool.
    pub mongo_max_pool_size: u32,
    /// Connections kept open by the MongoDB pool.
    pub mongo_min_pool_size: Option<u32>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        store_timeout_ms = config.store_timeout.as_millis() as u64,
                        allocation_attempts = config.allocation_attempts,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; absent keys keep their default.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Settings handed to every [`GameLifecycle`](crate::services::game_service::GameLifecycle).
    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            store_timeout: self.store_timeout,
            allocation_attempts: self.allocation_attempts,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            allocation_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
            mongo_max_pool_size: DEFAULT_MONGO_MAX_POOL_SIZE,
            mongo_min_pool_size: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    store_timeout_ms: Option<u64>,
    allocation_attempts: Option<u32>,
    mongo_max_pool_size: Option<u32>,
    mongo_min_pool_size: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            store_timeout: value
                .store_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            allocation_attempts: value
                .allocation_attempts
                .filter(|attempts| *attempts > 0)
                .unwrap_or(defaults.allocation_attempts),
            mongo_max_pool_size: value
                .mongo_max_pool_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.mongo_max_pool_size),
            mongo_min_pool_size: value.mongo_min_pool_size,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
