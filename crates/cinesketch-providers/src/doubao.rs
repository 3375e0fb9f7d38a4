//! Doubao (ByteDance Ark) adapter: chat-completions vision and Seedream
//! text-to-image.
//!
//! The image endpoint has no image-conditioned editing; reference images in a
//! request are ignored and only the text parts are sent.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use cinesketch_core::config::{DoubaoConfig, TimeoutConfig};
use cinesketch_core::types::ChatCompletionRequest;
use cinesketch_core::utils::truncate_string;
use cinesketch_core::{ProviderError, ProviderId};

use crate::classify::{classify_status, classify_transport};
use crate::http_provider::{vision_messages, ChatCompletionsEndpoint};
use crate::traits::{
    size_tier_for_width, Adapter, ChatOutput, GeneratedImage, ImageGen, ImageRequest, VisionChat,
    VisionRequest,
};
use crate::usage;

const IMAGE_PATH: &str = "/api/v3/images/generations";
const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const REASONING_EFFORT: &str = "medium";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    response_format: &'a str,
    size: &'a str,
    stream: bool,
    watermark: bool,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    url: Option<String>,
}

// ─────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────

pub struct DoubaoClient {
    client: reqwest::Client,
    api_key: String,
    chat: Option<ChatCompletionsEndpoint>,
    image_url: Option<String>,
    image_timeout_secs: u64,
    chat_model: String,
    image_model: String,
}

impl std::fmt::Debug for DoubaoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoubaoClient")
            .field("chat", &self.chat)
            .field("image_url", &self.image_url)
            .field("chat_model", &self.chat_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

impl DoubaoClient {
    /// Build from config. Needs a key; each endpoint is optional and checked
    /// when the matching capability is used.
    pub fn new(config: &DoubaoConfig, timeouts: &TimeoutConfig) -> Result<Self, ProviderError> {
        if !cinesketch_core::config::schema::is_real_key(&config.api_key) {
            return Err(ProviderError::config("Doubao API key not configured"));
        }

        let chat = match config.chat_endpoint.as_deref().filter(|e| !e.is_empty()) {
            Some(url) => Some(ChatCompletionsEndpoint::new(
                ProviderId::Doubao,
                url,
                config.api_key.clone(),
                timeouts.vision_secs,
            )?),
            None => None,
        };

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            chat,
            image_url: config
                .image_endpoint
                .as_deref()
                .filter(|e| !e.is_empty())
                .map(image_generations_url),
            image_timeout_secs: timeouts.image_secs,
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }
}

/// Accept either a base URL or the full generations URL.
pub fn image_generations_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.contains(IMAGE_PATH) {
        base.to_string()
    } else {
        format!("{base}{IMAGE_PATH}")
    }
}

impl Adapter for DoubaoClient {
    fn provider(&self) -> ProviderId {
        ProviderId::Doubao
    }
}

#[async_trait]
impl VisionChat for DoubaoClient {
    async fn complete(&self, model: &str, request: &VisionRequest) -> Result<ChatOutput, ProviderError> {
        let chat = self
            .chat
            .as_ref()
            .ok_or_else(|| ProviderError::config("Doubao chat endpoint not configured"))?;

        let body = ChatCompletionRequest {
            model: model.to_string(),
            messages: vision_messages(request),
            max_tokens: None,
            max_completion_tokens: Some(request.max_tokens.unwrap_or(DEFAULT_MAX_COMPLETION_TOKENS)),
            temperature: Some(request.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
            reasoning_effort: Some(REASONING_EFFORT.to_string()),
            response_format: None,
        };
        chat.send(&body).await
    }
}

#[async_trait]
impl ImageGen for DoubaoClient {
    fn supports_reference_images(&self) -> bool {
        false
    }

    async fn generate(&self, model: &str, request: &ImageRequest) -> Result<GeneratedImage, ProviderError> {
        let url = self
            .image_url
            .as_deref()
            .ok_or_else(|| ProviderError::config("Doubao image endpoint not configured"))?;

        if request.has_images() {
            warn!(model, "Doubao image generation ignores reference images");
        }

        let prompt = request.prompt();
        let size = size_tier_for_width(request.size.target_width());
        let body = ImageGenerationRequest {
            model,
            prompt: &prompt,
            response_format: "url",
            size,
            stream: false,
            watermark: true,
        };

        debug!(model, size, prompt_chars = prompt.len(), "Calling Doubao image generation");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(self.image_timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Doubao image request failed");
                classify_transport("Doubao", self.image_timeout_secs, &e)
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read Doubao image response");
            classify_transport("Doubao", self.image_timeout_secs, &e)
        })?;
        if !status.is_success() {
            error!(status = %status, "Doubao image API error");
            return Err(classify_status("Doubao", model, status.as_u16(), &text));
        }

        let parsed: ImageGenerationResponse =
            serde_json::from_str(&text).map_err(|e| {
                error!(error = %e, "Invalid Doubao image response");
                ProviderError::Parse {
                    preview: truncate_string(&text, 200),
                }
            })?;

        let image_url = parsed
            .data
            .into_iter()
            .find_map(|d| d.url.filter(|u| !u.is_empty()))
            .ok_or_else(|| {
                ProviderError::rejected(
                    "Doubao",
                    format!("No image URLs from Doubao. Response: {}", truncate_string(&text, 200)),
                )
            })?;

        let usage = usage::normalize(
            ProviderId::Doubao,
            model,
            parsed.usage.as_ref().unwrap_or(&serde_json::Value::Null),
        );

        Ok(GeneratedImage { image_url, usage })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Part;
    use cinesketch_core::{ErrorKind, ImageSize, InlineImage};
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> DoubaoConfig {
        DoubaoConfig {
            api_key: "ark-key".into(),
            chat_endpoint: Some(format!("{}/api/v3/chat/completions", server.uri())),
            image_endpoint: Some(server.uri()),
            ..Default::default()
        }
    }

    #[test]
    fn test_image_url_resolution() {
        assert_eq!(
            image_generations_url("https://ark.cn-beijing.volces.com/"),
            "https://ark.cn-beijing.volces.com/api/v3/images/generations"
        );
        assert_eq!(
            image_generations_url("https://ark.example/api/v3/images/generations"),
            "https://ark.example/api/v3/images/generations"
        );
    }

    #[test]
    fn test_requires_key() {
        let err = DoubaoClient::new(&DoubaoConfig::default(), &TimeoutConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_missing_image_endpoint_is_configuration_error() {
        let cfg = DoubaoConfig {
            api_key: "ark-key".into(),
            ..Default::default()
        };
        let client = DoubaoClient::new(&cfg, &TimeoutConfig::default()).unwrap();
        let req = ImageRequest::new(vec![Part::text("a cat")], ImageSize::OneK);

        let err = client.generate("seedream", &req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_vision_request_shape() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v3/chat/completions"))
            .and(header("Authorization", "Bearer ark-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "doubao-seed-1-6-lite-251015",
                "max_completion_tokens": 2048,
                "reasoning_effort": "medium",
                "temperature": 0.7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "[{\"title\":\"A\"}]" } }],
                "usage": { "prompt_tokens": 900, "completion_tokens": 100, "total_tokens": 1000 }
            })))
            .mount(&mock_server)
            .await;

        let client = DoubaoClient::new(&config(&mock_server), &TimeoutConfig::default()).unwrap();
        let req = VisionRequest::new(vec![Part::image(InlineImage::png("AAAA")), Part::text("Analyze")])
            .max_tokens(2048);

        let output = client.complete("doubao-seed-1-6-lite-251015", &req).await.unwrap();
        assert!(output.text.contains("title"));
        assert_eq!(output.usage.total_tokens, 1000);
        assert_eq!(output.usage.estimated_cost, "$0.000000");
    }

    #[tokio::test]
    async fn test_image_generation_sends_text_only() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v3/images/generations"))
            .and(body_json(serde_json::json!({
                "model": "doubao-seedream-4-0-250828",
                "prompt": "a paper boat in a storm",
                "response_format": "url",
                "size": "2K",
                "stream": false,
                "watermark": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "url": "https://cdn.example/boat.png" }]
            })))
            .mount(&mock_server)
            .await;

        let client = DoubaoClient::new(&config(&mock_server), &TimeoutConfig::default()).unwrap();
        let req = ImageRequest::new(
            vec![
                Part::text("a paper boat in a storm"),
                Part::image(InlineImage::png("IGNORED")),
            ],
            ImageSize::TwoK,
        );

        let image = client.generate("doubao-seedream-4-0-250828", &req).await.unwrap();
        assert_eq!(image.image_url, "https://cdn.example/boat.png");
        assert_eq!(image.usage, cinesketch_core::UsageRecord::zero());
    }

    #[tokio::test]
    async fn test_small_size_tier() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "size": "1K" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "url": "https://cdn.example/small.png" }]
            })))
            .mount(&mock_server)
            .await;

        let client = DoubaoClient::new(&config(&mock_server), &TimeoutConfig::default()).unwrap();
        let req = ImageRequest::new(vec![Part::text("x")], ImageSize::OneK);
        assert!(client.generate("seedream", &req).await.is_ok());
    }

    #[tokio::test]
    async fn test_no_images_is_content_rejection() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
            .mount(&mock_server)
            .await;

        let client = DoubaoClient::new(&config(&mock_server), &TimeoutConfig::default()).unwrap();
        let req = ImageRequest::new(vec![Part::text("x")], ImageSize::TwoK);

        let err = client.generate("seedream", &req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContentRejection);
        assert!(err.to_string().contains("No image URLs"));
    }

    #[tokio::test]
    async fn test_forbidden_is_auth() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": { "code": "AccessDenied", "message": "model not activated" }
            })))
            .mount(&mock_server)
            .await;

        let client = DoubaoClient::new(&config(&mock_server), &TimeoutConfig::default()).unwrap();
        let req = ImageRequest::new(vec![Part::text("x")], ImageSize::TwoK);

        let err = client.generate("seedream", &req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    #[tokio::test]
    async fn test_cut_off_image_body_is_retryable() {
        let base = crate::http_provider::truncated_body_server().await;
        let cfg = DoubaoConfig {
            api_key: "ark-key".into(),
            image_endpoint: Some(base),
            ..Default::default()
        };
        let client = DoubaoClient::new(&cfg, &TimeoutConfig::default()).unwrap();
        let req = ImageRequest::new(vec![Part::text("x")], ImageSize::TwoK);

        let err = client.generate("seedream", &req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.is_availability());
    }
}
