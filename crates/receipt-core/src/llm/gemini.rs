//! Gemini provider using the Generative Language `generateContent` API.
//!
//! Images travel as base64 `inline_data` parts next to the text instruction.

use super::provider::{ExtractionRequest, LlmProvider, LlmResponse, RequestPart, TokenUsage};
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Gemini provider for the `generateContent` endpoint.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create with a custom API base URL and request timeout.
    pub fn with_endpoint(endpoint: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Classify a failed send. reqwest's `Display` hides the cause, so the
    /// message carries the whole source chain.
    fn send_error(&self, e: &reqwest::Error) -> PipelineError {
        if e.is_timeout() {
            return PipelineError::Timeout {
                stage: "request".to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            };
        }
        let message = format!("Gemini request failed: {}", error_chain(e));
        if e.is_connect() || e.is_request() {
            PipelineError::Network { message }
        } else {
            PipelineError::Llm {
                message,
                status_code: None,
            }
        }
    }
}

fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

impl From<&RequestPart> for Part {
    fn from(part: &RequestPart) -> Self {
        match part {
            RequestPart::Text(text) => Part::Text { text: text.clone() },
            RequestPart::Image(image) => Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.media_type.clone(),
                    data: image.data.clone(),
                },
            },
        }
    }
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[serde(default)]
    status: String,
}

impl From<UsageMetadata> for TokenUsage {
    fn from(u: UsageMetadata) -> Self {
        let total = if u.total_token_count > 0 {
            u.total_token_count
        } else {
            u.prompt_token_count + u.candidates_token_count
        };
        Self {
            prompt_tokens: u.prompt_token_count,
            candidates_tokens: u.candidates_token_count,
            total_tokens: total,
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &ExtractionRequest) -> Result<LlmResponse, PipelineError> {
        let start = Instant::now();

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: request.parts.iter().map(Part::from).collect(),
            }],
        };

        tracing::debug!(
            "Gemini generateContent: model={} images={}",
            self.model,
            request.image_count()
        );

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| self.send_error(&e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<GeminiError>(&text) {
                Ok(err) if err.error.status.is_empty() => err.error.message,
                Ok(err) => format!("{} ({})", err.error.message, err.error.status),
                Err(_) => text,
            };
            return Err(PipelineError::Llm {
                message: format!("Gemini HTTP {status}: {detail}"),
                status_code: Some(status.as_u16()),
            });
        }

        let gen_resp: GenerateContentResponse =
            resp.json().await.map_err(|e| PipelineError::Llm {
                message: format!("Failed to parse Gemini response: {e}"),
                status_code: None,
            })?;

        let Some(candidate) = gen_resp.candidates.into_iter().next() else {
            let reason = gen_resp
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(PipelineError::Llm {
                message: format!("Gemini returned no content: {reason}"),
                status_code: None,
            });
        };

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim().to_string();
        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "unknown".to_string());
            return Err(PipelineError::Llm {
                message: format!("Gemini returned empty response (finish reason: {reason})"),
                status_code: None,
            });
        }

        Ok(LlmResponse {
            text,
            model: gen_resp.model_version.unwrap_or_else(|| self.model.clone()),
            usage: gen_resp
                .usage_metadata
                .map(TokenUsage::from)
                .unwrap_or_default(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ImageInput;
    use std::path::Path;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> GeminiProvider {
        GeminiProvider::with_endpoint(
            &server.uri(),
            "test-key",
            "gemini-test",
            Duration::from_secs(5),
        )
    }

    fn request() -> ExtractionRequest {
        ExtractionRequest::single(ImageInput::from_bytes(&[1, 2, 3], Path::new("r.png")))
    }

    fn ok_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 1200,
                "candidatesTokenCount": 300,
                "totalTokenCount": 1500
            },
            "modelVersion": "gemini-test-001"
        })
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("```json\n[]\n```")))
            .expect(1)
            .mount(&server)
            .await;

        let resp = provider(&server).generate(&request()).await.unwrap();
        assert_eq!(resp.text, "```json\n[]\n```");
        assert_eq!(resp.model, "gemini-test-001");
        assert_eq!(
            resp.usage,
            TokenUsage {
                prompt_tokens: 1200,
                candidates_tokens: 300,
                total_tokens: 1500,
            }
        );
    }

    #[tokio::test]
    async fn test_request_body_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("{}")))
            .mount(&server)
            .await;

        let images = vec![
            ImageInput::from_bytes(&[1], Path::new("a.png")),
            ImageInput::from_bytes(&[2], Path::new("b.jpg")),
        ];
        provider(&server)
            .generate(&ExtractionRequest::batch(images))
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(parts.len(), 3);
        assert!(parts[0]["text"].as_str().unwrap().contains("image_index"));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[2]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[2]["inline_data"]["data"], "Ag==");
    }

    #[tokio::test]
    async fn test_http_error_carries_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {
                    "code": 429,
                    "message": "Resource has been exhausted",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate(&request()).await.unwrap_err();
        match err {
            PipelineError::Llm {
                message,
                status_code,
            } => {
                assert_eq!(status_code, Some(429));
                assert!(message.contains("Resource has been exhausted"));
                assert!(message.contains("RESOURCE_EXHAUSTED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate(&request()).await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_empty_text_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "finishReason": "MAX_TOKENS" }]
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate(&request()).await.unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[tokio::test]
    async fn test_missing_total_is_summed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "{}" }] } }],
                "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 5 }
            })))
            .mount(&server)
            .await;

        let resp = provider(&server).generate(&request()).await.unwrap();
        assert_eq!(resp.usage.total_tokens, 15);
        assert_eq!(resp.model, "gemini-test");
    }

    #[tokio::test]
    async fn test_connection_refused_is_retryable() {
        let provider = GeminiProvider::with_endpoint(
            "http://127.0.0.1:9",
            "k",
            "gemini-test",
            Duration::from_secs(2),
        );
        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Network { .. }), "{err:?}");
        assert!(crate::llm::is_retryable(&err));
        // The OS-level cause sits below reqwest's top-level message
        assert!(err.to_string().to_lowercase().contains("refused"), "{err}");
    }

    #[tokio::test]
    async fn test_slow_response_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body("[]"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_endpoint(
            &server.uri(),
            "k",
            "gemini-test",
            Duration::from_millis(50),
        );
        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout { timeout_ms: 50, .. }), "{err:?}");
        assert!(crate::llm::is_retryable(&err));
    }
}
