//! Error types for the receipt extraction pipeline.
//!
//! Errors are organized by stage to provide clear, actionable error messages
//! that include relevant context (file paths, stage names, HTTP status codes).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for receipt extraction operations.
#[derive(Error, Debug)]
pub enum ReceiptError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// API credential errors
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while locating the API key.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The credential file does not exist
    #[error(
        "API key file not found: {path}\n  \
         Create it and paste your API key into it, or set {env_var}."
    )]
    NotFound { path: PathBuf, env_var: String },

    /// The credential file exists but holds no key
    #[error("API key file is empty: {path}")]
    Empty { path: PathBuf },

    /// The credential file could not be read
    #[error("Failed to read API key file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Reading an input image failed
    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// The inference service returned an error or could not be reached
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        status_code: Option<u16>,
    },

    /// The service could not be reached or the connection dropped
    #[error("Network error: {message}")]
    Network { message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// The model response is not valid JSON
    #[error("Response is not valid JSON: {message}")]
    ResponseJson { message: String },

    /// A batch response parsed but is not a JSON array
    #[error("Response is not a JSON array (got {found})")]
    ResponseNotArray { found: String },

    /// Writing an extraction result failed
    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// Appending to the usage ledger failed
    #[error("Failed to update usage report {path}: {message}")]
    Ledger { path: PathBuf, message: String },
}

/// Convenience type alias for receipt extraction results.
pub type Result<T> = std::result::Result<T, ReceiptError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
