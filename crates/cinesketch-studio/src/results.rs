//! Operation inputs and outputs, plus the shaping of model JSON into them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cinesketch_core::wav::pcm_to_wav;
use cinesketch_core::{ImageSize, PromptIdea, ProviderError, UsageRecord};
use cinesketch_providers::find_array;

use crate::prompts::{is_known_voice, DEFAULT_VOICE, DEFAULT_VOICE_REASON};

/// Most ideas an analysis returns.
pub const MAX_IDEAS: usize = 3;

// ─────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────

/// A text-to-image request, optionally guided by a reference image.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRequest {
    pub prompt: String,
    /// Requested model, or `"doubao"` for the Doubao text-to-image branch.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub size: ImageSize,
    /// Base64 or `data:` URL.
    #[serde(default)]
    pub reference_image: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl SceneRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// Edit an existing scene, optionally compositing in a second image.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub image: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub blend_image: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub size: ImageSize,
}

// ─────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchAnalysis {
    pub ideas: Vec<PromptIdea>,
    pub usage: UsageRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneImage {
    /// `https://` URL or `data:image/...;base64,` URL.
    pub image_url: String,
    /// The model that actually produced the image.
    pub model: String,
    pub usage: UsageRecord,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProperty {
    pub id: String,
    pub category: String,
    pub name: String,
    pub value: String,
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPlan {
    pub optimized_prompt: String,
    pub properties: Vec<EditProperty>,
    pub usage: UsageRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceRecommendation {
    pub voice_name: String,
    pub reason: String,
    pub usage: UsageRecord,
}

/// Raw speech audio (24 kHz, mono, 16-bit PCM).
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechClip {
    pub pcm: Vec<u8>,
    pub usage: UsageRecord,
}

impl SpeechClip {
    /// The clip as a playable WAV file.
    pub fn to_wav(&self) -> Vec<u8> {
        pcm_to_wav(&self.pcm)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbienceDescription {
    pub description: String,
    pub usage: UsageRecord,
}

// ─────────────────────────────────────────────
// Shaping
// ─────────────────────────────────────────────

/// First non-empty string among `keys`.
fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| record.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

/// Turn extracted JSON into at most [`MAX_IDEAS`] ideas.
///
/// Accepts a bare array or an object wrapping one, and the key spellings
/// models tend to use. Zero ideas is a parse error.
pub fn ideas_from_json(value: &Value) -> Result<Vec<PromptIdea>, ProviderError> {
    let preview = || ProviderError::Parse {
        preview: value.to_string().chars().take(200).collect(),
    };

    let records = find_array(value).ok_or_else(preview)?;
    let ideas: Vec<PromptIdea> = records
        .iter()
        .filter(|r| r.is_object())
        .take(MAX_IDEAS)
        .enumerate()
        .map(|(i, r)| PromptIdea {
            id: format!("idea-{i}"),
            title: field(r, &["title", "Title"]).unwrap_or_default().to_string(),
            description: field(r, &["description", "Description"])
                .unwrap_or_default()
                .to_string(),
            technical_prompt: field(r, &["technicalPrompt", "technical_prompt", "TechnicalPrompt"])
                .unwrap_or_default()
                .to_string(),
        })
        .collect();

    if ideas.is_empty() {
        return Err(preview());
    }
    Ok(ideas)
}

/// Read a casting answer, falling back to the default voice.
pub fn voice_from_json(value: &Value) -> (String, String) {
    let voice = field(value, &["voiceName"])
        .filter(|v| is_known_voice(v))
        .unwrap_or(DEFAULT_VOICE);
    let reason = field(value, &["reason"]).unwrap_or(DEFAULT_VOICE_REASON);
    (voice.to_string(), reason.to_string())
}

/// Read an edit-analyzer answer. `stamp` keeps property ids unique across calls.
pub fn edit_plan_from_json(
    value: &Value,
    stamp: i64,
    usage: UsageRecord,
) -> Result<EditPlan, ProviderError> {
    let invalid = || ProviderError::Parse {
        preview: "Invalid response from AI prompt analyzer".to_string(),
    };

    let optimized_prompt = field(value, &["optimizedPrompt"]).ok_or_else(invalid)?;
    let properties = value
        .get("properties")
        .and_then(Value::as_array)
        .ok_or_else(invalid)?
        .iter()
        .enumerate()
        .map(|(idx, prop)| EditProperty {
            id: format!("prop-{idx}-{stamp}"),
            category: field(prop, &["category"]).unwrap_or("General").to_string(),
            name: field(prop, &["name"]).unwrap_or("Property").to_string(),
            value: field(prop, &["value"]).unwrap_or_default().to_string(),
            is_active: true,
        })
        .collect();

    Ok(EditPlan {
        optimized_prompt: optimized_prompt.to_string(),
        properties,
        usage,
    })
}
