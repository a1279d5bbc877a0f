//! slotgate configuration system
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Environment variables (SLOTGATE_CONCURRENCY, SLOTGATE_LOG)
//! 3. Config file (--config PATH, else ~/.config/slotgate/config.toml)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use slotgate::util::config::load;
//!
//! let config = load(None).unwrap();
//! println!("concurrency = {}", config.runner.concurrency);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::runtime::ConcurrencyLimit;
use crate::util::logger::LogLevel;

/// Environment override for `runner.concurrency`.
pub const ENV_CONCURRENCY: &str = "SLOTGATE_CONCURRENCY";
/// Environment override for `log.level`.
pub const ENV_LOG: &str = "SLOTGATE_LOG";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SlotgateConfig {
    /// Runner settings
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Queue demo settings
    #[serde(default)]
    pub demo: DemoConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunnerConfig {
    /// Maximum concurrently executing units
    #[serde(default)]
    pub concurrency: ConcurrencyLimit,
}

/// Queue demo configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Task durations in milliseconds, one entry per task
    #[serde(default = "default_tasks_ms")]
    pub tasks_ms: Vec<u64>,
    /// 1-based ids of tasks scripted to fail
    #[serde(default)]
    pub fail: Vec<usize>,
}

fn default_tasks_ms() -> Vec<u64> {
    vec![800, 900, 1000, 1100, 1200, 1000]
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tasks_ms: default_tasks_ms(),
            fail: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LogConfig {
    /// Minimum level printed
    #[serde(default)]
    pub level: LogLevel,
}

impl SlotgateConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Render as a TOML document.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn apply_overrides<F>(
        &mut self,
        lookup: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CONCURRENCY) {
            let parsed: i64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_override(ENV_CONCURRENCY, &value, "not an integer"))?;
            self.runner.concurrency = ConcurrencyLimit::try_from(parsed)
                .map_err(|e| ConfigError::invalid_override(ENV_CONCURRENCY, &value, e))?;
        }

        if let Some(value) = lookup(ENV_LOG) {
            self.log.level = value
                .parse()
                .map_err(|e: String| ConfigError::invalid_override(ENV_LOG, &value, e))?;
        }

        Ok(())
    }
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    // Try XDG config directory on Unix
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("slotgate"));
    }

    // Fallback to ~/.config/slotgate
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("slotgate"));
    }

    // On Windows, try %APPDATA%
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("slotgate"));
    }

    None
}

/// Get the user config file path (~/.config/slotgate/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load configuration from a specific file
pub fn load_from_path(path: &Path) -> Result<SlotgateConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SlotgateConfig::from_toml(&content)
}

/// Load user-level configuration
/// Returns default config if file doesn't exist
pub fn load_user_config() -> Result<SlotgateConfig, ConfigError> {
    match get_config_path() {
        Some(path) if path.exists() => load_from_path(&path),
        _ => Ok(SlotgateConfig::default()),
    }
}

/// Resolve file and environment layers.
///
/// An explicit path must exist; the user-level file is optional.
pub fn load(explicit: Option<&Path>) -> Result<SlotgateConfig, ConfigError> {
    load_skipping(explicit, &[])
}

/// Like [`load`], but ignores the environment variables in `superseded`.
///
/// The CLI passes the keys it is about to override with its own flags, so a
/// bad value in the environment cannot fail a run that never uses it.
pub fn load_skipping(
    explicit: Option<&Path>,
    superseded: &[&str],
) -> Result<SlotgateConfig, ConfigError> {
    load_layers(explicit, without_keys(|key| std::env::var(key).ok(), superseded))
}

/// Resolve the file layer, then apply overrides from `lookup`.
pub fn load_layers<F>(
    explicit: Option<&Path>,
    lookup: F,
) -> Result<SlotgateConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match explicit {
        Some(path) => load_from_path(path)?,
        None => load_user_config()?,
    };
    config.apply_overrides(lookup)?;
    Ok(config)
}

/// Hide `superseded` keys from `lookup`.
pub fn without_keys<'a, F>(
    lookup: F,
    superseded: &'a [&'a str],
) -> impl Fn(&str) -> Option<String> + 'a
where
    F: Fn(&str) -> Option<String> + 'a,
{
    move |key| {
        if superseded.contains(&key) {
            None
        } else {
            lookup(key)
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Environment override has an unusable value
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidOverride {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid_override(
        key: &'static str,
        value: &str,
        reason: impl ToString,
    ) -> Self {
        ConfigError::InvalidOverride {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
