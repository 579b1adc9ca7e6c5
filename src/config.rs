//! Configuration loading and management
//!
//! Handles parsing of `taskboard.toml` in the data directory. Every field is
//! optional; a missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::lease::parse_duration;

/// File name of the configuration inside the data directory
pub const CONFIG_FILENAME: &str = "taskboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Simulated peer activity
    #[serde(default)]
    pub activity: ActivityConfig,

    /// Action log retention
    #[serde(default)]
    pub log: LogConfig,

    /// Edit lease behaviour
    #[serde(default)]
    pub editing: EditingConfig,
}

/// Peer-activity generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Run the generator while a user is logged in
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Tick period (e.g., "12s")
    #[serde(default = "default_activity_interval")]
    pub interval: String,

    /// Chance per tick that a peer change is produced
    #[serde(default = "default_activity_probability")]
    pub probability: f64,
}

fn default_true() -> bool {
    true
}

fn default_activity_interval() -> String {
    "12s".to_string()
}

fn default_activity_probability() -> f64 {
    0.3
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: default_activity_interval(),
            probability: default_activity_probability(),
        }
    }
}

impl ActivityConfig {
    /// Tick period as a std duration for the timer
    pub fn interval(&self) -> Result<std::time::Duration> {
        let duration = parse_duration(&self.interval)?
            .to_std()
            .ok()
            .filter(|period| !period.is_zero());
        duration.ok_or_else(|| {
            Error::InvalidConfig(format!(
                "activity.interval must be positive, got '{}'",
                self.interval
            ))
        })
    }
}

/// Action log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Number of most recent actions retained
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
}

fn default_log_capacity() -> usize {
    crate::activity::DEFAULT_CAPACITY
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
        }
    }
}

/// Edit lease configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditingConfig {
    /// How long an edit claim stays valid without renewal
    #[serde(default = "default_lease_ttl")]
    pub lease_ttl: String,
}

fn default_lease_ttl() -> String {
    "5m".to_string()
}

impl Default for EditingConfig {
    fn default() -> Self {
        Self {
            lease_ttl: default_lease_ttl(),
        }
    }
}

impl EditingConfig {
    pub fn lease_ttl(&self) -> Result<chrono::Duration> {
        parse_duration(&self.lease_ttl)
    }
}

impl Config {
    /// Load configuration from a `taskboard.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory.
    ///
    /// A missing file yields the defaults. A file that exists but does not
    /// parse or validate is an error, never silently replaced.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let config_path = config_path(data_dir);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load(&config_path).map_err(|err| match err {
            Error::InvalidConfig(message) => {
                Error::InvalidConfig(format!("{}: {message}", config_path.display()))
            }
            other => Error::InvalidConfig(format!("{}: {other}", config_path.display())),
        })
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        crate::lock::write_atomic(path, content.as_bytes())
    }

    fn validate(&self) -> Result<()> {
        let interval = parse_duration(&self.activity.interval)
            .map_err(|err| Error::InvalidConfig(format!("activity.interval: {err}")))?;
        if interval <= chrono::Duration::zero() {
            return Err(Error::InvalidConfig(
                "activity.interval must be > 0".to_string(),
            ));
        }

        let probability = self.activity.probability;
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidConfig(format!(
                "activity.probability must be within [0, 1], got {probability}"
            )));
        }

        if self.log.capacity == 0 {
            return Err(Error::InvalidConfig(
                "log.capacity must be > 0".to_string(),
            ));
        }

        let ttl = parse_duration(&self.editing.lease_ttl)
            .map_err(|err| Error::InvalidConfig(format!("editing.lease_ttl: {err}")))?;
        if ttl <= chrono::Duration::zero() {
            return Err(Error::InvalidConfig(
                "editing.lease_ttl must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Path of the config file inside a data directory
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILENAME)
}

/// Resolve the data directory.
///
/// Resolution order:
/// 1) CLI --data-dir (explicit)
/// 2) TASKBOARD_DIR environment variable
/// 3) Platform data directory
/// 4) `.taskboard` under the current directory
pub fn resolve_data_dir(cli_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = cli_dir {
        return dir.to_path_buf();
    }

    if let Ok(env_dir) = std::env::var("TASKBOARD_DIR") {
        let trimmed = env_dir.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "taskboard") {
        return dirs.data_dir().to_path_buf();
    }

    PathBuf::from(".taskboard")
}
