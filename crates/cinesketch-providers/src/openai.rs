//! OpenAI vision adapter: the last-resort sketch analyzer.

use async_trait::async_trait;

use cinesketch_core::config::{OpenAiConfig, TimeoutConfig};
use cinesketch_core::types::{ChatCompletionRequest, ResponseFormat};
use cinesketch_core::{ProviderError, ProviderId};

use crate::http_provider::{vision_messages, ChatCompletionsEndpoint};
use crate::traits::{Adapter, ChatOutput, VisionChat, VisionRequest};

const DEFAULT_MAX_TOKENS: u32 = 2048;

#[derive(Debug)]
pub struct OpenAiClient {
    endpoint: ChatCompletionsEndpoint,
    default_model: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, timeouts: &TimeoutConfig) -> Result<Self, ProviderError> {
        if !config.is_configured() {
            return Err(ProviderError::config("OpenAI API key not configured"));
        }

        let base = config.api_base.trim_end_matches('/');
        let endpoint = ChatCompletionsEndpoint::new(
            ProviderId::OpenAi,
            format!("{base}/chat/completions"),
            config.api_key.clone(),
            timeouts.vision_secs,
        )?;

        Ok(Self {
            endpoint,
            default_model: config.model.clone(),
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

impl Adapter for OpenAiClient {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenAi
    }
}

#[async_trait]
impl VisionChat for OpenAiClient {
    async fn complete(&self, model: &str, request: &VisionRequest) -> Result<ChatOutput, ProviderError> {
        let body = ChatCompletionRequest {
            model: model.to_string(),
            messages: vision_messages(request),
            max_tokens: Some(request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
            max_completion_tokens: None,
            temperature: request.temperature,
            reasoning_effort: None,
            response_format: request.json.then(ResponseFormat::json_object),
        };
        self.endpoint.send(&body).await
    }
}
