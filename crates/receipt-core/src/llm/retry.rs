//! Retry policy for transient inference failures.
//!
//! Rate limits, server errors, timeouts and dropped connections are retried
//! with exponential backoff; anything the service rejected on its merits
//! (bad key, malformed request, unknown model) fails immediately.

use crate::error::PipelineError;
use std::time::Duration;

/// Upper bound for a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How often, and how patiently, a failed request is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub attempts: u32,
    /// Delay before the first retry; doubles for each further retry
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            attempts,
            base_delay_ms,
        }
    }

    /// Delay to wait before attempt number `attempt` (0-based).
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        match attempt {
            0 => None,
            n => Some(backoff_duration(n - 1, self.base_delay_ms)),
        }
    }

    /// Whether attempt `attempt` (0-based) that failed with `error` gets another go.
    pub fn should_retry(&self, error: &PipelineError, attempt: u32) -> bool {
        attempt < self.attempts && is_retryable(error)
    }
}

/// Whether an error is transient.
pub fn is_retryable(error: &PipelineError) -> bool {
    match error {
        PipelineError::Timeout { .. } | PipelineError::Network { .. } => true,
        PipelineError::Llm {
            status_code: Some(code),
            ..
        } => matches!(code, 408 | 429 | 500..=599),
        _ => false,
    }
}

/// `base_delay_ms * 2^attempt`, capped at [`MAX_BACKOFF`].
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay).min(MAX_BACKOFF)
}
