//! Runtime application configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use super::ConfigError;
use super::defaults::{self, DEFAULT_SETTINGS};
use super::validation::validate_setting;
use crate::watcher::{FileFilter, WatchOptions, WatchTarget};

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_directory: PathBuf,
    pub file_filter: String,
    pub corner_radius: u32,
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub settle_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset. Required keys without a value fail with
    /// [`ConfigError::Missing`]; every value is validated before parsing.
    pub fn load(source: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut values = std::collections::HashMap::new();
        for key in defaults::keys() {
            let Some(def) = DEFAULT_SETTINGS.get(key) else {
                continue;
            };
            let value = source(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| def.default.to_string());

            if value.is_empty() {
                if def.required {
                    return Err(ConfigError::Missing {
                        key,
                        description: def.description,
                    });
                }
                continue;
            }

            validate_setting(key, &value)
                .map_err(|reason| ConfigError::Invalid { key, reason })?;
            values.insert(key, value);
        }

        let g = |key: &'static str| -> &str { values.get(key).map_or("", String::as_str) };

        Ok(Self {
            base_directory: PathBuf::from(g("BASE_DIRECTORY")),
            file_filter: g("FILE_FILTER").to_string(),
            corner_radius: parse(g("CORNER_RADIUS"), "CORNER_RADIUS")?,
            worker_count: parse(g("WORKER_COUNT"), "WORKER_COUNT")?,
            queue_capacity: parse(g("QUEUE_CAPACITY"), "QUEUE_CAPACITY")?,
            settle_timeout: Duration::from_millis(parse(g("SETTLE_TIMEOUT_MS"), "SETTLE_TIMEOUT_MS")?),
        })
    }

    /// The immutable watch target described by this configuration.
    pub fn watch_target(&self) -> Result<WatchTarget, ConfigError> {
        let file_filter =
            FileFilter::new(&self.file_filter).map_err(|e| ConfigError::Invalid {
                key: "FILE_FILTER",
                reason: e.to_string(),
            })?;
        Ok(WatchTarget {
            base_directory: self.base_directory.clone(),
            file_filter,
            corner_radius: self.corner_radius,
        })
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            worker_count: self.worker_count,
            queue_capacity: self.queue_capacity,
            settle_timeout: self.settle_timeout,
        }
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &'static str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        reason: format!("cannot parse '{value}'"),
    })
}
