//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Work/break interval durations
//! - Reminder toggles
//! - Presence surface toggle
//! - Automation commands fired on work start/end
//!
//! Configuration is stored at `~/.config/tomata/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, CoreError, ValidationError};
use crate::timer::{TimerConfig, DEFAULT_BREAK_SECS, DEFAULT_WORK_SECS};

/// Timer interval configuration, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSection {
    #[serde(default = "default_work_secs")]
    pub work_duration_secs: u64,
    #[serde(default = "default_break_secs")]
    pub break_duration_secs: u64,
}

/// Reminder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Ambient presence surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Shell commands fired when a work interval starts or naturally ends.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AutomationSection {
    #[serde(default)]
    pub on_work_start: Option<String>,
    #[serde(default)]
    pub on_work_end: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/tomata/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerSection,
    #[serde(default)]
    pub notifications: NotificationsSection,
    #[serde(default)]
    pub presence: PresenceSection,
    #[serde(default)]
    pub automation: AutomationSection,
}

fn default_work_secs() -> u64 {
    DEFAULT_WORK_SECS
}
fn default_break_secs() -> u64 {
    DEFAULT_BREAK_SECS
}
fn default_true() -> bool {
    true
}

impl Default for TimerSection {
    fn default() -> Self {
        Self {
            work_duration_secs: DEFAULT_WORK_SECS,
            break_duration_secs: DEFAULT_BREAK_SECS,
        }
    }
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for PresenceSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: TimerSection::default(),
            notifications: NotificationsSection::default(),
            presence: PresenceSection::default(),
            automation: AutomationSection::default(),
        }
    }
}

impl Config {
    fn lookup<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.').try_fold(root, |node, part| node.get(part))
    }

    fn update(
        root: &mut serde_json::Value,
        key: &str,
        raw: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut node = root;
        if let Some(parents) = parents {
            for part in parents.split('.') {
                node = node.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = node.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let parsed = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                raw.parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{raw}' as bool")))?,
            ),
            serde_json::Value::Number(_) => {
                if let Ok(n) = raw.parse::<u64>() {
                    serde_json::Value::Number(n.into())
                } else {
                    return Err(invalid(format!("cannot parse '{raw}' as number")));
                }
            }
            // Optional string fields round-trip as null; "none" clears them.
            serde_json::Value::Null | serde_json::Value::String(_) => {
                if raw.eq_ignore_ascii_case("none") {
                    serde_json::Value::Null
                } else {
                    serde_json::Value::String(raw.to_string())
                }
            }
            _ => return Err(invalid("unsupported value type".to_string())),
        };

        obj.insert(leaf.to_string(), parsed);
        Ok(())
    }

    fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)
                    .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
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
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), CoreError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::lookup(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::update(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }

    /// Validated engine configuration from the `[timer]` section.
    pub fn timer_config(&self) -> Result<TimerConfig, ValidationError> {
        TimerConfig::new(self.timer.work_duration_secs, self.timer.break_duration_secs)
    }
}
