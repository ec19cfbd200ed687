//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Notification threshold and enablement
//! - Review service endpoint and API token
//! - Poll interval tuning for the decision engine
//!
//! Configuration is stored at `~/.config/reviewbell/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::notifier::Tuning;

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Reviews-available count at/above which a notification is shown.
    #[serde(default = "default_threshold")]
    pub threshold: u32,
}

/// Review service connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_token: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/reviewbell/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub tuning: Tuning,
}

fn default_true() -> bool {
    true
}
fn default_threshold() -> u32 {
    1
}
fn default_endpoint() -> String {
    "https://api.example.com/v2/summary".into()
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_threshold(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_token: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notifier: NotifierConfig::default(),
            service: ServiceConfig::default(),
            tuning: Tuning::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = json.pointer(&pointer(key))?.clone();
        match val {
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, coercing the string to the
    /// existing field's type. Returns error if the key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        let slot = json
            .pointer_mut(&pointer(key))
            .ok_or_else(|| format!("unknown config key: {key}"))?;

        let new_value = match &*slot {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<u64>()
                    .map_err(|_| format!("cannot parse '{value}' as number"))?;
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => serde_json::from_str(value)?,
            serde_json::Value::String(_) => serde_json::Value::String(value.into()),
        };
        *slot = new_value;

        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }
}

fn pointer(key: &str) -> String {
    format!("/{}", key.replace('.', "/"))
}
