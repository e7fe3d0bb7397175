//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// File holding the API key (relative paths resolve against the working directory)
    pub credential_file: PathBuf,

    /// Environment variable consulted before the credential file
    pub api_key_env: String,

    /// Directory offered by interactive mode when none is entered
    pub default_input_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            credential_file: PathBuf::from("api_key.txt"),
            api_key_env: "GEMINI_API_KEY".to_string(),
            default_input_dir: PathBuf::from("example"),
        }
    }
}

/// Inference model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Gemini model identifier
    pub name: String,

    /// Base URL of the Generative Language API
    pub endpoint: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.5-flash-lite-preview-06-17".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Supported input formats (file extensions, case-insensitive)
    pub supported_formats: Vec<String>,

    /// Images per request in batched mode
    pub batch_size: usize,

    /// Descend into subdirectories when discovering images
    pub recursive: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            batch_size: 5,
            recursive: false,
        }
    }
}

/// Retry settings for transient API failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max retry attempts for transient failures (0 disables retries)
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum image file size in megabytes
    pub max_file_size_mb: u64,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 20,
            request_timeout_ms: 120_000,
        }
    }
}

/// How batch token usage is attributed to the files of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchAttribution {
    /// Divide the batch totals evenly across the files sent
    #[default]
    Split,
    /// Record the full batch totals on every file's row
    Shared,
}

/// Usage report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// CSV file name, created in the input directory
    pub file_name: String,

    /// Attribution of batch usage to individual rows
    pub batch_attribution: BatchAttribution,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            file_name: "usage_report.csv".to_string(),
            batch_attribution: BatchAttribution::Split,
        }
    }
}

/// Pricing overrides layered on top of the built-in table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// USD per million tokens for models missing from the table
    pub default_rate: f64,

    /// Extra or replacement rates, keyed by model identifier
    pub rates: BTreeMap<String, f64>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_rate: 0.10,
            rates: BTreeMap::new(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
