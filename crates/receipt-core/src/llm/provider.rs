//! LLM provider trait and request/response types.
//!
//! Defines the interface the inference backend implements, plus the request
//! builder that packages receipt images with the extraction instruction.

use super::prompt::{BATCH_PROMPT, SINGLE_PROMPT};
use crate::config::Config;
use crate::error::PipelineError;
use async_trait::async_trait;
use base64::Engine;
use std::path::Path;
use std::time::Duration;

/// Base64-encoded image ready to send to an LLM API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes, taking the MIME type from the
    /// file extension.
    ///
    /// Unknown extensions fall back to content sniffing, then to `image/png`.
    pub fn from_bytes(bytes: &[u8], path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let media_type = match extension.as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            _ => match image::guess_format(bytes) {
                Ok(image::ImageFormat::Jpeg) => "image/jpeg",
                Ok(image::ImageFormat::WebP) => "image/webp",
                Ok(image::ImageFormat::Png) => "image/png",
                _ => {
                    tracing::warn!("Unknown image type for {:?}, defaulting to image/png", path);
                    "image/png"
                }
            },
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }
}

/// One piece of a request, in the order the model receives it.
#[derive(Debug, Clone)]
pub enum RequestPart {
    Text(String),
    Image(ImageInput),
}

/// A request to extract receipt data from one or more images.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub parts: Vec<RequestPart>,
}

impl ExtractionRequest {
    /// Image first, then the single-receipt instruction.
    pub fn single(image: ImageInput) -> Self {
        Self {
            parts: vec![
                RequestPart::Image(image),
                RequestPart::Text(SINGLE_PROMPT.to_string()),
            ],
        }
    }

    /// Batch instruction first, then every image in index order.
    pub fn batch(images: Vec<ImageInput>) -> Self {
        let mut parts = Vec::with_capacity(images.len() + 1);
        parts.push(RequestPart::Text(BATCH_PROMPT.to_string()));
        parts.extend(images.into_iter().map(RequestPart::Image));
        Self { parts }
    }

    /// Number of images carried by the request.
    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, RequestPart::Image(_)))
            .count()
    }
}

/// Token counts reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub candidates_tokens: u64,
    pub total_tokens: u64,
}

/// The response from an extraction call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Raw generated text (expected to be JSON, possibly fenced)
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Token usage for the whole request
    pub usage: TokenUsage,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait the inference backend implements.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn LlmProvider>` for dynamic dispatch).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to; also the pricing key.
    fn model(&self) -> &str;

    /// Send the request and return the generated text with usage.
    async fn generate(&self, request: &ExtractionRequest) -> Result<LlmResponse, PipelineError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Create the Gemini provider from config, an API key and an optional model override.
pub fn create_provider(
    config: &Config,
    api_key: &str,
    model_override: Option<&str>,
) -> Box<dyn LlmProvider> {
    let model = model_override.unwrap_or(&config.model.name);
    Box::new(super::gemini::GeminiProvider::with_endpoint(
        &config.model.endpoint,
        api_key,
        model,
        Duration::from_millis(config.limits.request_timeout_ms),
    ))
}
