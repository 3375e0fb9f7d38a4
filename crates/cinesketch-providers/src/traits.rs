//! Provider capability traits: the seams between the studio and the backends.
//!
//! Each backend implements only the capabilities it has. A fallback chain is
//! typed by capability (`Candidate<dyn ImageGen>`), so a provider that cannot
//! synthesize speech can never end up in a speech chain.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use cinesketch_core::{ImageSize, InlineImage, ProviderError, ProviderId, UsageRecord};

// ─────────────────────────────────────────────
// Request / response values
// ─────────────────────────────────────────────

/// One piece of multimodal input, in the order the model should see it.
#[derive(Clone, Debug, PartialEq)]
pub enum Part {
    Text(String),
    Image(InlineImage),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn image(image: InlineImage) -> Self {
        Part::Image(image)
    }
}

/// Join the text parts of a request (for text-only backends).
fn joined_text(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            Part::Text(t) => Some(t.as_str()),
            Part::Image(_) => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Instruction + images for a vision/chat model.
#[derive(Clone, Debug, Default)]
pub struct VisionRequest {
    pub parts: Vec<Part>,
    /// System instruction, if the backend supports one.
    pub system: Option<String>,
    /// Ask for JSON output (JSON mode / `responseMimeType`).
    pub json: bool,
    /// Gemini `responseSchema`; ignored by other backends.
    pub response_schema: Option<Value>,
    /// `None` → backend default.
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl VisionRequest {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            parts,
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.json = true;
        self.response_schema = Some(schema);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Free text returned by a vision/chat model.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatOutput {
    pub text: String,
    pub usage: UsageRecord,
}

/// Prompt (+ optional reference images) for an image model.
#[derive(Clone, Debug, Default)]
pub struct ImageRequest {
    pub parts: Vec<Part>,
    pub size: ImageSize,
    pub temperature: Option<f64>,
}

impl ImageRequest {
    pub fn new(parts: Vec<Part>, size: ImageSize) -> Self {
        Self {
            parts,
            size,
            temperature: None,
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// All text parts joined; what a text-to-image backend sends.
    pub fn prompt(&self) -> String {
        joined_text(&self.parts)
    }

    pub fn has_images(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Image(_)))
    }
}

/// A generated image, as an `http(s)` URL or a `data:` URL.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedImage {
    pub image_url: String,
    pub usage: UsageRecord,
}

/// Text to speak with a prebuilt voice.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
}

/// Raw 24 kHz 16-bit mono PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechOutput {
    pub pcm: Vec<u8>,
    pub usage: UsageRecord,
}

/// Size hint for backends that only accept a coarse tier: `"2K"` at ≥1920px, else `"1K"`.
pub fn size_tier_for_width(width: u32) -> &'static str {
    if width >= 1920 {
        "2K"
    } else {
        "1K"
    }
}

// ─────────────────────────────────────────────
// Capability traits
// ─────────────────────────────────────────────

/// Common identity for every backend.
pub trait Adapter: Send + Sync {
    fn provider(&self) -> ProviderId;
}

/// Chat/vision completion returning free text.
#[async_trait]
pub trait VisionChat: Adapter {
    async fn complete(&self, model: &str, request: &VisionRequest) -> Result<ChatOutput, ProviderError>;
}

/// Text-to-image (and, where supported, image-conditioned editing).
#[async_trait]
pub trait ImageGen: Adapter {
    /// Whether image parts in the request are used. Backends that return `false`
    /// generate from the text parts alone.
    fn supports_reference_images(&self) -> bool;

    async fn generate(&self, model: &str, request: &ImageRequest) -> Result<GeneratedImage, ProviderError>;
}

/// Text-to-speech.
#[async_trait]
pub trait SpeechSynth: Adapter {
    async fn synthesize(&self, model: &str, request: &SpeechRequest) -> Result<SpeechOutput, ProviderError>;
}

// ─────────────────────────────────────────────
// Candidate
// ─────────────────────────────────────────────

/// One (provider, model) pairing eligible to serve a request.
pub struct Candidate<A: ?Sized> {
    pub adapter: Arc<A>,
    pub model: String,
}

impl<A: ?Sized> Candidate<A> {
    pub fn new(adapter: Arc<A>, model: impl Into<String>) -> Self {
        Self {
            adapter,
            model: model.into(),
        }
    }
}

impl<A: Adapter + ?Sized> Candidate<A> {
    /// `Provider/model`, used in logs and exhaustion errors.
    pub fn label(&self) -> String {
        format!("{}/{}", self.adapter.provider(), self.model)
    }
}

impl<A: ?Sized> Clone for Candidate<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
            model: self.model.clone(),
        }
    }
}

impl<A: Adapter + ?Sized> fmt::Debug for Candidate<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("provider", &self.adapter.provider())
            .field("model", &self.model)
            .finish()
    }
}
