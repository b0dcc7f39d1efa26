//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Fragmentation thresholds for the linter
//! - Daily capacity and focus hours for the planner
//! - Log level and output format
//!
//! Configuration is stored at `~/.config/chronolint/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::linter::{
    LintConfig, DEFAULT_FRAGMENTATION_MAX_MINUTES, DEFAULT_FRAGMENTATION_MIN_MINUTES,
};
use crate::scheduler::{FocusHours, PlannerConfig};

/// Linter thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintSection {
    #[serde(default = "default_min_gap")]
    pub fragmentation_min_minutes: i64,
    #[serde(default = "default_max_gap")]
    pub fragmentation_max_minutes: i64,
}

/// Planner defaults applied when a request does not override them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerSection {
    #[serde(default)]
    pub capacity_per_day_minutes: Option<u32>,
    #[serde(default)]
    pub focus_start_hour: Option<u32>,
    #[serde(default)]
    pub focus_end_hour: Option<u32>,
}

/// Log output settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lint: LintSection,
    #[serde(default)]
    pub planner: PlannerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

fn default_min_gap() -> i64 {
    DEFAULT_FRAGMENTATION_MIN_MINUTES
}
fn default_max_gap() -> i64 {
    DEFAULT_FRAGMENTATION_MAX_MINUTES
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LintSection {
    fn default() -> Self {
        Self {
            fragmentation_min_minutes: default_min_gap(),
            fragmentation_max_minutes: default_max_gap(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        if key.is_empty() {
            return Err(unknown());
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => match value.parse::<i64>() {
                    Ok(n) => serde_json::Value::Number(n.into()),
                    Err(_) => return Err(invalid(format!("cannot parse '{value}' as number"))),
                },
                // Optional settings: "none" clears, integers set
                serde_json::Value::Null => {
                    if value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("null") {
                        serde_json::Value::Null
                    } else if let Ok(n) = value.parse::<i64>() {
                        serde_json::Value::Number(n.into())
                    } else {
                        serde_json::Value::String(value.into())
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                serde_json::Value::String(_) => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Path of the config file in the data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults first if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path.
    ///
    /// # Errors
    /// Returns `LoadFailed` if the file cannot be read and `ParseFailed` if it
    /// is not a valid configuration.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The change is in memory until saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every leaf setting as `(dot.path, value)`, in key order.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `InvalidValue` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lint_config().map_err(|e| ConfigError::InvalidValue {
            key: "lint".to_string(),
            message: e.to_string(),
        })?;
        self.planner_config().map_err(|e| ConfigError::InvalidValue {
            key: "planner".to_string(),
            message: e.to_string(),
        })?;
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!("expected 'pretty' or 'json', got '{}'", self.logging.format),
            });
        }
        Ok(())
    }

    /// Fragmentation band for the linter.
    pub fn lint_config(&self) -> Result<LintConfig, crate::error::ValidationError> {
        LintConfig::new(
            self.lint.fragmentation_min_minutes,
            self.lint.fragmentation_max_minutes,
        )
    }

    /// Planner defaults. Focus hours apply only when both ends are set.
    pub fn planner_config(&self) -> Result<PlannerConfig, crate::error::ValidationError> {
        let focus_hours = match (self.planner.focus_start_hour, self.planner.focus_end_hour) {
            (Some(start_hour), Some(end_hour)) => Some(FocusHours {
                start_hour,
                end_hour,
            }),
            _ => None,
        };
        let config = PlannerConfig {
            capacity_per_day: self.planner.capacity_per_day_minutes,
            focus_hours,
        };
        config.validate()?;
        Ok(config)
    }
}
