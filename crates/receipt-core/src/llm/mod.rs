//! LLM integration for receipt extraction.
//!
//! Provides the provider abstraction, the Gemini backend, the prompts that
//! accompany the images, and the retry policy for transient failures.

pub(crate) mod gemini;
pub mod prompt;
pub(crate) mod provider;
pub(crate) mod retry;

pub use gemini::GeminiProvider;
pub use provider::{
    create_provider, ExtractionRequest, ImageInput, LlmProvider, LlmResponse, RequestPart,
    TokenUsage,
};
pub use retry::{backoff_duration, is_retryable, RetryPolicy};
