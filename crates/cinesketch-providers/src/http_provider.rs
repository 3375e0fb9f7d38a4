//! OpenAI-compatible `/chat/completions` client shared by the Doubao and
//! OpenAI vision adapters.
//!
//! Handles bearer auth, the per-request timeout, status classification, and
//! turning `choices[0].message.content` + `usage` into a [`ChatOutput`].

use std::time::Duration;

use tracing::{debug, error};

use cinesketch_core::types::{
    ChatCompletionRequest, ChatCompletionResponse, ContentPart, Message,
};
use cinesketch_core::utils::truncate_string;
use cinesketch_core::{ProviderError, ProviderId};

use crate::classify::{classify_status, classify_transport};
use crate::traits::{ChatOutput, Part, VisionRequest};
use crate::usage;

/// A single chat-completions URL plus credentials.
pub struct ChatCompletionsEndpoint {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// Full request URL.
    url: String,
    /// API key for Bearer authentication.
    api_key: String,
    provider: ProviderId,
    /// Request budget in seconds.
    timeout_secs: u64,
}

impl std::fmt::Debug for ChatCompletionsEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsEndpoint")
            .field("url", &self.url)
            .field("provider", &self.provider)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ChatCompletionsEndpoint {
    pub fn new(
        provider: ProviderId,
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            provider,
            timeout_secs,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST a request and return the first choice's text.
    ///
    /// Blank content is a `ContentRejection`.
    pub async fn send(&self, request: &ChatCompletionRequest) -> Result<ChatOutput, ProviderError> {
        let provider = self.provider.display_name();

        debug!(
            provider,
            model = %request.model,
            messages = request.messages.len(),
            "Calling chat completions"
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(provider, error = %e, "HTTP request failed");
                classify_transport(provider, self.timeout_secs, &e)
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| {
            error!(provider, error = %e, "Failed to read response body");
            classify_transport(provider, self.timeout_secs, &e)
        })?;

        if !status.is_success() {
            error!(provider, status = %status, "API error");
            return Err(classify_status(provider, &request.model, status.as_u16(), &raw));
        }

        let body: ChatCompletionResponse = serde_json::from_str(&raw).map_err(|e| {
            error!(provider, error = %e, "Failed to parse chat response");
            ProviderError::Parse {
                preview: truncate_string(&raw, 200),
            }
        })?;

        let text = body
            .first_content()
            .ok_or_else(|| ProviderError::rejected(provider, "empty response content"))?
            .to_string();

        let usage = usage::normalize(
            self.provider,
            &request.model,
            body.usage.as_ref().unwrap_or(&serde_json::Value::Null),
        );

        debug!(
            provider,
            chars = text.len(),
            finish_reason = body
                .choices
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("?"),
            "Chat response received"
        );

        Ok(ChatOutput { text, usage })
    }
}

/// Convert a [`VisionRequest`] into chat messages: optional system message,
/// then one user message with text and `data:` URL image parts in order.
pub fn vision_messages(request: &VisionRequest) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system {
        messages.push(Message::system(system.clone()));
    }

    let parts = request
        .parts
        .iter()
        .map(|p| match p {
            Part::Text(text) => ContentPart::text(text.clone()),
            Part::Image(image) => ContentPart::image(image.to_data_url()),
        })
        .collect();
    messages.push(Message::user_parts(parts));
    messages
}

/// A local server that promises a JSON body in its headers, sends a fragment,
/// then hangs up. Returns its base URL.
#[cfg(test)]
pub(crate) async fn truncated_body_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..end]
            .lines()
            .find_map(|line| {
                line.to_ascii_lowercase()
                    .strip_prefix("content-length:")
                    .map(|v| v.trim().parse::<usize>().unwrap_or(0))
            })
            .unwrap_or(0);
        raw.len() >= end + 4 + length
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut raw = Vec::new();
            let mut buf = [0u8; 8192];
            while !request_complete(&raw) {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => raw.extend_from_slice(&buf[..n]),
                }
            }
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 4096\r\n\r\n{\"choices\":[",
                )
                .await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{addr}")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
