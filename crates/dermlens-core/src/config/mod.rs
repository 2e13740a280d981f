//! Configuration management for dermlens.
//!
//! Configuration is loaded from the platform config directory with defaults
//! for every field. The fixed analysis constants are the defaults of the
//! matching fields.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for dermlens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Batch processing settings
    pub processing: ProcessingConfig,

    /// Input limits
    pub limits: LimitsConfig,

    /// Embedding model settings
    pub embedding: EmbeddingConfig,

    /// Scoring and postprocessing settings
    pub scoring: ScoringConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.dermlens.dermlens/config.toml
    /// - Linux: ~/.config/dermlens/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\dermlens\config\config.toml
    ///
    /// Falls back to ~/.dermlens/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "dermlens", "dermlens")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".dermlens").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Directory holding the selected encoder's files.
    pub fn encoder_dir(&self) -> PathBuf {
        self.model_dir().join(&self.embedding.model)
    }

    /// Directory for the cached condition bank.
    ///
    /// Sits next to the models directory: if `model_dir` is
    /// `~/.dermlens/models`, the cache lands at `~/.dermlens/cache`.
    pub fn cache_dir(&self) -> PathBuf {
        let model_dir = self.model_dir();
        model_dir.parent().unwrap_or(&model_dir).join("cache")
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
