//! Runtime configuration loaded from the environment.
//!
//! | key                           | default          |
//! |-------------------------------|------------------|
//! | `TODO_DB_PATH`                | `todo.sqlite3`   |
//! | `TODO_RECONCILE_INTERVAL_SECS`| `600`            |
//! | `TODO_LOG_LEVEL`              | build dependent  |
//! | `TODO_LOG_DIR`                | unset (stderr)   |

use crate::logging::default_log_level;
use crate::reconcile::{ReconcilerConfig, DEFAULT_RECONCILE_INTERVAL};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "TODO_DB_PATH";
pub const ENV_RECONCILE_INTERVAL_SECS: &str = "TODO_RECONCILE_INTERVAL_SECS";
pub const ENV_LOG_LEVEL: &str = "TODO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TODO_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "todo.sqlite3";

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} `{}`: {}", self.key, self.value, self.reason)
    }
}

impl Error for ConfigError {}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub reconcile_interval: Duration,
    pub log_level: String,
    /// Rolling log files go here; `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = get(ENV_RECONCILE_INTERVAL_SECS) {
            config.reconcile_interval = parse_interval(&raw)?;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = get(ENV_LOG_DIR).map(PathBuf::from);

        Ok(config)
    }

    pub fn reconciler(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            interval: self.reconcile_interval,
        }
    }
}

/// Parses a whole number of seconds, at least 1.
pub fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason| ConfigError {
        key: ENV_RECONCILE_INTERVAL_SECS,
        value: raw.to_string(),
        reason,
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected whole seconds"))?;
    if secs == 0 {
        return Err(invalid("must be at least 1 second"));
    }
    Ok(Duration::from_secs(secs))
}
