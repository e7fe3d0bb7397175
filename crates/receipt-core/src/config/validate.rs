//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "processing.batch_size must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.name must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.report.file_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "report.file_name must not be empty".into(),
            ));
        }
        if !self.pricing.default_rate.is_finite() || self.pricing.default_rate < 0.0 {
            return Err(ConfigError::ValidationError(
                "pricing.default_rate must be a non-negative number".into(),
            ));
        }
        if let Some((model, _)) = self
            .pricing
            .rates
            .iter()
            .find(|(_, rate)| !rate.is_finite() || **rate < 0.0)
        {
            return Err(ConfigError::ValidationError(format!(
                "pricing.rates.\"{model}\" must be a non-negative number"
            )));
        }
        Ok(())
    }
}
