//! TOML configuration for the monitor.
//!
//! Values come from compiled-in defaults, an optional TOML file and finally
//! the environment variables the hosted deployments already use
//! (`TARGET_URL`, `PORT`, `CRON_SECRET`).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target probed when nothing else is configured.
pub const DEFAULT_TARGET_URL: &str = "https://n8n-t6ib.onrender.com/";

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "SITEPULSE_CONFIG";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid target url '{url}': {reason}")]
    InvalidTargetUrl { url: String, reason: String },

    #[error("invalid cron expression '{expr}': {reason}")]
    InvalidSchedule { expr: String, reason: String },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the effective configuration.
    ///
    /// 1. `path` if given, else the file named by `SITEPULSE_CONFIG`, else defaults.
    /// 2. Environment overrides.
    /// 3. Validation.
    ///
    /// Also returns the file the values came from, if any. Runs before the
    /// subscriber exists, so callers log the outcome.
    pub fn resolve(path: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let source = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        };
        let mut config = match &source {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok((config, source))
    }

    /// Apply `TARGET_URL`, `PORT` and `CRON_SECRET` through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TARGET_URL").filter(|v| !v.is_empty()) {
            self.target.url = url;
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(secret) = lookup("CRON_SECRET").filter(|v| !v.is_empty()) {
            self.server.check_secret = Some(secret);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        reqwest::Url::parse(&self.target.url).map_err(|e| ConfigError::InvalidTargetUrl {
            url: self.target.url.clone(),
            reason: e.to_string(),
        })?;
        self.schedule.parse()?;
        if self.server.port == 0 {
            return Err(ConfigError::Zero("server.port"));
        }
        if self.target.timeout_ms == 0 {
            return Err(ConfigError::Zero("target.timeout_ms"));
        }
        if self.schedule.history_capacity == 0 {
            return Err(ConfigError::Zero("schedule.history_capacity"));
        }
        Ok(())
    }

    /// `host:port` to listen on.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub url: String,
    /// Hard per-probe timeout in milliseconds.
    pub timeout_ms: u64,
}

impl TargetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TARGET_URL.to_string(),
            timeout_ms: crate::probes::DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token required by the manual check endpoint. Unset disables the check.
    pub check_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            check_secret: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Cron expression with a seconds field.
    pub cron: String,
    /// Delay before the first check after start-up.
    pub initial_delay_secs: u64,
    pub history_capacity: usize,
}

impl ScheduleConfig {
    pub fn parse(&self) -> Result<cron::Schedule, ConfigError> {
        cron::Schedule::from_str(&self.cron).map_err(|e| ConfigError::InvalidSchedule {
            expr: self.cron.clone(),
            reason: e.to_string(),
        })
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: "0 * * * * *".to_string(),
            initial_delay_secs: 2,
            history_capacity: crate::storage::DEFAULT_CAPACITY,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}
