//! Configuration for the step runner and its logging.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::SheetflowError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetflowConfig {
    /// Step runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LogConfig,
}

impl SheetflowConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SheetflowError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SheetflowError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks field values that serde cannot.
    pub fn validate(&self) -> Result<(), SheetflowError> {
        if self.logging.filter.trim().is_empty() {
            return Err(SheetflowError::Config(
                "logging.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Step runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Log elapsed time and memory usage of every step at debug level.
    #[serde(default = "default_true")]
    pub diagnostics: bool,
    /// Ask the sheet to refresh its display when a monitor is bound.
    #[serde(default = "default_true")]
    pub display_ui: bool,
    /// Append the step parameter to progress notifications.
    #[serde(default = "default_true")]
    pub notify_params: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            diagnostics: default_true(),
            display_ui: default_true(),
            notify_params: default_true(),
        }
    }
}

impl RunnerConfig {
    /// Creates a runner configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables step diagnostics.
    #[must_use]
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Enables or disables display refresh.
    #[must_use]
    pub fn with_display_ui(mut self, enabled: bool) -> Self {
        self.display_ui = enabled;
        self
    }

    /// Enables or disables parameters in notifications.
    #[must_use]
    pub fn with_notify_params(mut self, enabled: bool) -> Self {
        self.notify_params = enabled;
        self
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Filter directives, used when `RUST_LOG` is not set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_filter(),
        }
    }
}
