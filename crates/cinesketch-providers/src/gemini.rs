//! Google Gemini adapter over the REST `generateContent` endpoint.
//!
//! One endpoint serves all three capabilities; the generation config selects
//! the output modality:
//! - text (vision analysis, voice casting, ambience)
//! - `["Image"]` (scene generation and editing)
//! - `["AUDIO"]` + prebuilt voice (speech)

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use cinesketch_core::config::{GeminiConfig, TimeoutConfig};
use cinesketch_core::utils::truncate_string;
use cinesketch_core::{InlineImage, ProviderError, ProviderId};

use crate::classify::{classify_status, classify_transport, MAX_ERROR_CHARS};
use crate::traits::{
    Adapter, ChatOutput, GeneratedImage, ImageGen, ImageRequest, Part, SpeechOutput, SpeechRequest,
    SpeechSynth, VisionChat, VisionRequest,
};
use crate::usage;

const PROVIDER: &str = "Gemini";
const ASPECT_RATIO: &str = "16:9";
/// The only image model that accepts an explicit `imageSize`.
const SIZED_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

impl Content {
    fn of(parts: Vec<WirePart>) -> Self {
        Self { role: None, parts }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "inline_data")]
    inline_data: Option<Blob>,
}

impl From<&Part> for WirePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => WirePart {
                text: Some(text.clone()),
                inline_data: None,
            },
            Part::Image(image) => WirePart {
                text: None,
                inline_data: Some(Blob {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    #[serde(default, alias = "mime_type")]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
    #[serde(default)]
    usage_metadata: Option<Value>,
    #[serde(default)]
    prompt_feedback: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseCandidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> &[WirePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.parts().iter().filter_map(|p| p.text.as_deref()).collect()
    }

    fn finish_reason(&self) -> &str {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .unwrap_or("Unknown")
    }

    fn usage_raw(&self) -> &Value {
        self.usage_metadata.as_ref().unwrap_or(&Value::Null)
    }
}

// ─────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────

/// Gemini `generateContent` client implementing vision, image, and speech.
pub struct GeminiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    timeouts: TimeoutConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, timeouts: &TimeoutConfig) -> Result<Self, ProviderError> {
        if !config.is_configured() {
            return Err(ProviderError::config("Gemini API key not configured"));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeouts: timeouts.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        timeout_secs: u64,
    ) -> Result<GenerateContentResponse, ProviderError> {
        debug!(
            provider = PROVIDER,
            model,
            parts = request.contents.iter().map(|c| c.parts.len()).sum::<usize>(),
            "Calling generateContent"
        );

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .timeout(Duration::from_secs(timeout_secs))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, model, error = %e, "HTTP request failed");
                classify_transport(PROVIDER, timeout_secs, &e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify_transport(PROVIDER, timeout_secs, &e))?;

        if !status.is_success() {
            error!(provider = PROVIDER, model, status = %status, "API error");
            return Err(classify_status(PROVIDER, model, status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(provider = PROVIDER, model, error = %e, "Invalid JSON response");
            ProviderError::Parse {
                preview: truncate_string(&body, 200),
            }
        })
    }
}

impl Adapter for GeminiClient {
    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
    }
}

#[async_trait]
impl VisionChat for GeminiClient {
    /// Blank text is returned as-is; callers decide what an empty answer means.
    async fn complete(&self, model: &str, request: &VisionRequest) -> Result<ChatOutput, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content::of(request.parts.iter().map(WirePart::from).collect())],
            system_instruction: request.system.as_ref().map(|s| {
                Content::of(vec![WirePart {
                    text: Some(s.clone()),
                    inline_data: None,
                }])
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: request.json.then_some("application/json"),
                response_schema: request.response_schema.clone(),
                ..Default::default()
            },
        };

        let response = self.generate_content(model, &body, self.timeouts.vision_secs).await?;
        if response.candidates.is_empty() {
            let reason = response
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.get("blockReason"))
                .and_then(Value::as_str)
                .unwrap_or("no candidates returned");
            return Err(ProviderError::rejected(PROVIDER, reason));
        }

        Ok(ChatOutput {
            text: response.text(),
            usage: usage::normalize(ProviderId::Gemini, model, response.usage_raw()),
        })
    }
}

#[async_trait]
impl ImageGen for GeminiClient {
    fn supports_reference_images(&self) -> bool {
        true
    }

    async fn generate(&self, model: &str, request: &ImageRequest) -> Result<GeneratedImage, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content::of(request.parts.iter().map(WirePart::from).collect())],
            system_instruction: None,
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["Image"]),
                temperature: request.temperature,
                image_config: Some(ImageConfig {
                    aspect_ratio: ASPECT_RATIO,
                    image_size: (model == SIZED_IMAGE_MODEL).then(|| request.size.as_str()),
                }),
                ..Default::default()
            },
        };

        let response = self.generate_content(model, &body, self.timeouts.image_secs).await?;
        let usage = usage::normalize(ProviderId::Gemini, model, response.usage_raw());

        let mut text = String::new();
        for part in response.parts() {
            if let Some(blob) = part.inline_data.as_ref().filter(|b| !b.data.is_empty()) {
                let mime_type = if blob.mime_type.is_empty() {
                    "image/png".to_string()
                } else {
                    blob.mime_type.clone()
                };
                let image = InlineImage {
                    mime_type,
                    data: blob.data.clone(),
                };
                debug!(provider = PROVIDER, model, mime = %image.mime_type, "Image received");
                return Ok(GeneratedImage {
                    image_url: image.to_data_url(),
                    usage,
                });
            }
            if let Some(t) = &part.text {
                text.push_str(t);
            }
        }

        let reason = if text.is_empty() {
            format!("Failed to generate image (Reason: {})", response.finish_reason())
        } else {
            text
        };
        Err(ProviderError::rejected(
            PROVIDER,
            reason.chars().take(MAX_ERROR_CHARS).collect::<String>(),
        ))
    }
}

#[async_trait]
impl SpeechSynth for GeminiClient {
    async fn synthesize(&self, model: &str, request: &SpeechRequest) -> Result<SpeechOutput, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content::of(vec![WirePart {
                text: Some(request.text.clone()),
                inline_data: None,
            }])],
            system_instruction: None,
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["AUDIO"]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: request.voice.clone(),
                        },
                    },
                }),
                ..Default::default()
            },
        };

        let response = self.generate_content(model, &body, self.timeouts.speech_secs).await?;
        let usage = usage::normalize(ProviderId::Gemini, model, response.usage_raw());

        // Text parts (e.g. a transcript) may precede the audio
        let audio = response
            .parts()
            .iter()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|b| !b.data.is_empty() && (b.mime_type.is_empty() || b.mime_type.starts_with("audio/")))
            .map(|b| b.data.as_str())
            .ok_or_else(|| ProviderError::rejected(PROVIDER, "No audio generated"))?;

        let pcm = BASE64
            .decode(audio.as_bytes())
            .map_err(|e| ProviderError::rejected(PROVIDER, format!("audio payload is not valid base64: {e}")))?;

        debug!(provider = PROVIDER, model, bytes = pcm.len(), "Audio received");
        Ok(SpeechOutput { pcm, usage })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
