//! Core configuration types and loading.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Identity and channels.
    pub bot: BotConfig,
    /// Where the persisted stores live.
    #[serde(default)]
    pub resources: ResourceConfig,
    /// Admin plugin behaviour.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Plugin settings exposed through `get`/`set`, one table per plugin.
    #[serde(default)]
    pub settings: BTreeMap<String, BTreeMap<String, toml::Value>>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Settings flattened to `plugin.setting` keys with string values.
    pub fn flat_settings(&self) -> BTreeMap<String, String> {
        let mut flat = BTreeMap::new();
        for (plugin, table) in &self.settings {
            for (key, value) in table {
                let value = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                flat.insert(format!("{plugin}.{key}"), value);
            }
        }
        flat
    }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Nickname the bot connects with.
    pub nickname: String,
    /// Command prefix for chat commands (e.g. "!").
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Primary channels.
    #[serde(default)]
    pub home_channels: Vec<String>,
    /// Secondary channels.
    #[serde(default)]
    pub guest_channels: Vec<String>,
}

/// Resource file locations.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    /// Directory holding `users.json`, `hostmasks.json` and `channels.json`.
    #[serde(default = "default_resource_dir")]
    pub directory: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            directory: default_resource_dir(),
        }
    }
}

impl ResourceConfig {
    /// Classification store file.
    pub fn users_file(&self) -> PathBuf {
        self.directory.join("users.json")
    }

    /// Hostmask store file.
    pub fn hostmasks_file(&self) -> PathBuf {
        self.directory.join("hostmasks.json")
    }

    /// Saved home/guest channel lists.
    pub fn channels_file(&self) -> PathBuf {
        self.directory.join("channels.json")
    }
}

/// Admin plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Seconds to wait between part and rejoin when `cycle` names no delay.
    #[serde(default)]
    pub cycle_delay_secs: u64,
    /// Log every inbound raw line.
    #[serde(default)]
    pub printraw: bool,
    /// Log the bytes of every inbound message body.
    #[serde(default)]
    pub printbytes: bool,
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_resource_dir() -> PathBuf {
    PathBuf::from("resources")
}
