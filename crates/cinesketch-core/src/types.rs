//! Core types for Cinesketch.
//!
//! Two families live here:
//! - domain values handed back to callers (`UsageRecord`, `PromptIdea`, `ImageSize`)
//! - the OpenAI-style chat completions wire format shared by the Doubao and
//!   OpenAI vision adapters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// The AI backends Cinesketch knows how to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    Doubao,
    OpenAi,
}

impl ProviderId {
    /// Human-readable name for logs and error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderId::Gemini => "Gemini",
            ProviderId::Doubao => "Doubao",
            ProviderId::OpenAi => "OpenAI",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ─────────────────────────────────────────────
// Usage
// ─────────────────────────────────────────────

/// Normalized token usage and estimated cost for one operation.
///
/// Every operation returns one, even when the provider reports nothing
/// (image endpoints): counts are then zero and the cost is `"$0.000000"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost: String,
}

impl UsageRecord {
    /// All-zero usage.
    pub fn zero() -> Self {
        UsageRecord {
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            estimated_cost: "$0.000000".to_string(),
        }
    }
}

impl Default for UsageRecord {
    fn default() -> Self {
        Self::zero()
    }
}

// ─────────────────────────────────────────────
// Sketch analysis
// ─────────────────────────────────────────────

/// One cinematic interpretation of an uploaded sketch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptIdea {
    pub id: String,
    pub title: String,
    pub description: String,
    pub technical_prompt: String,
}

// ─────────────────────────────────────────────
// Image size tiers
// ─────────────────────────────────────────────

/// Requested output resolution tier. `4K` is only honoured by Gemini 3 Pro Image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1K")]
    OneK,
    #[default]
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    /// Wire label (`"1K"`, `"2K"`, `"4K"`).
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }

    /// Pixel width used when a provider wants explicit dimensions.
    pub fn target_width(self) -> u32 {
        match self {
            ImageSize::OneK => 1024,
            ImageSize::TwoK | ImageSize::FourK => 1920,
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(ImageSize::OneK),
            "2K" => Ok(ImageSize::TwoK),
            "4K" => Ok(ImageSize::FourK),
            other => Err(format!("unknown image size '{other}' (expected 1K, 2K or 4K)")),
        }
    }
}

// ─────────────────────────────────────────────
// Inline media
// ─────────────────────────────────────────────

/// Base64 image payload without any `data:` prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// A PNG payload (the format every caller uploads in).
    pub fn png(data: impl Into<String>) -> Self {
        InlineImage {
            mime_type: "image/png".to_string(),
            data: data.into(),
        }
    }

    /// Render as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

// ─────────────────────────────────────────────
// Chat completions wire format (OpenAI-compatible)
// ─────────────────────────────────────────────

/// A chat message in the OpenAI format.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "user")]
    User { content: MessageContent },
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Create a user message with text content.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message with multipart content (text + images).
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Message::User {
            content: MessageContent::Parts(parts),
        }
    }
}

/// User message content: either plain text or multipart (for vision).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A single part of a multipart message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail: None,
            },
        }
    }
}

/// Image URL payload (a URL or a base64 data URI).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// `response_format` for JSON mode.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        ResponseFormat {
            format_type: "json_object".to_string(),
        }
    }
}

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// Raw chat completion response. `usage` is kept untyped so the usage
/// accountant can normalize whatever shape the provider sends.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
