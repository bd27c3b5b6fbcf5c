//! nalamini.toml configuration parser with environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::env::{self, non_empty};
use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NalaminiConfig {
    pub environment: Option<String>,
    pub database_url: Option<String>,
    pub server: ServerConfig,
    pub migrations: MigrationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: None,
        }
    }
}

/// Settings handed to the bootstrapper's connection pool constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    /// Overall bound on one run, covering acquisition and every statement.
    pub timeout_secs: u64,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_connections: 1,
            acquire_timeout_secs: 10,
        }
    }
}

impl MigrationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl NalaminiConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: NalaminiConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Load the optional config file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its raw value.
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(environment) = non_empty(lookup(env::NODE_ENV)) {
            self.environment = Some(environment);
        }
        if let Some(url) = non_empty(lookup(env::DATABASE_URL)) {
            self.database_url = Some(url);
        }
        if let Some(raw) = non_empty(lookup(env::PORT)) {
            let port = raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: env::PORT,
                value: raw.clone(),
                reason: e.to_string(),
            })?;
            self.server.port = Some(port);
        }
        if let Some(raw) = non_empty(lookup(env::MIGRATION_TIMEOUT_SECS)) {
            let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: env::MIGRATION_TIMEOUT_SECS,
                value: raw.clone(),
                reason: e.to_string(),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: env::MIGRATION_TIMEOUT_SECS,
                    value: raw,
                    reason: "must be greater than zero".to_string(),
                });
            }
            self.migrations.timeout_secs = secs;
        }
        Ok(self)
    }

    /// Environment label, `"unknown"` when unset.
    pub fn environment(&self) -> &str {
        self.environment
            .as_deref()
            .unwrap_or(env::UNKNOWN_ENVIRONMENT)
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn require_database_url(&self) -> ConfigResult<&str> {
        self.database_url().ok_or(ConfigError::Missing(env::DATABASE_URL))
    }

    pub fn port_or(&self, default: u16) -> u16 {
        self.server.port.unwrap_or(default)
    }
}
