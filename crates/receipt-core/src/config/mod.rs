//! Configuration management for receipt extraction.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section is optional in the TOML file.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Inference model settings
    pub model: ModelConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Retry settings
    pub pipeline: PipelineConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Usage report settings
    pub report: ReportConfig,

    /// Pricing overrides
    pub pricing: PricingConfig,

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
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.receipt-extract.receipt-extract/config.toml
    /// - Linux: ~/.config/receipt-extract/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\receipt-extract\config\config.toml
    ///
    /// Falls back to ~/.receipt-extract/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "receipt-extract", "receipt-extract")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home)
                    .join(".receipt-extract")
                    .join("config.toml")
            })
    }

    /// Get the resolved credential file path (with ~ expansion).
    pub fn credential_file(&self) -> PathBuf {
        let path_str = self.general.credential_file.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.processing.batch_size, 5);
        assert_eq!(config.model.name, "gemini-2.5-flash-lite-preview-06-17");
        assert_eq!(config.report.file_name, "usage_report.csv");
        assert_eq!(config.report.batch_attribution, BatchAttribution::Split);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[model]"));
        assert!(toml.contains("[processing]"));
        assert!(toml.contains("[report]"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [processing]
            batch_size = 3

            [report]
            batch_attribution = "shared"

            [pricing.rates]
            "gemini-3.0-flash" = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(config.processing.batch_size, 3);
        assert_eq!(config.processing.supported_formats.len(), 3);
        assert_eq!(config.report.batch_attribution, BatchAttribution::Shared);
        assert_eq!(config.pricing.rates.get("gemini-3.0-flash"), Some(&0.2));
        assert_eq!(config.pipeline.retry_attempts, 2);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[processing]\nbatch_size = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_credential_file_default_is_relative() {
        let config = Config::default();
        assert_eq!(config.credential_file(), PathBuf::from("api_key.txt"));
    }
}
