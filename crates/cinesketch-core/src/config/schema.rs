//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProvidersConfig` (`gemini`, `doubao`, `openai`),
//! `RetryConfig`, `TimeoutConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.cinesketch/config.json` + env vars.
///
/// Built once and handed to the studio; nothing below the CLI reads the
/// environment on its own.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub retry: RetryConfig,
    pub timeouts: TimeoutConfig,
}

/// Whether an API key is usable (non-empty and not a template placeholder).
pub fn is_real_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != "your_api_key" && !key.starts_with("your_")
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// All provider configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub gemini: GeminiConfig,
    pub doubao: DoubaoConfig,
    pub openai: OpenAiConfig,
}

/// Google Gemini (`generateContent`): vision, image, and speech.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    /// Model used for sketch analysis, voice casting, and ambience text.
    pub analyze_model: String,
    /// Default image model when the caller does not request one.
    pub image_model: String,
    /// Image model tried after the requested and default models.
    pub image_fallback_model: String,
    /// Text-to-speech model.
    pub speech_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            analyze_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            image_fallback_model: "gemini-2.5-flash-preview-05-20".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn is_configured(&self) -> bool {
        is_real_key(&self.api_key)
    }
}

/// ByteDance Doubao: chat-completions vision and Seedream text-to-image.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoubaoConfig {
    pub api_key: String,
    /// Full chat completions URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_endpoint: Option<String>,
    pub chat_model: String,
    /// Image generation base URL or full `/api/v3/images/generations` URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_endpoint: Option<String>,
    pub image_model: String,
}

impl Default for DoubaoConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            chat_endpoint: None,
            chat_model: "doubao-seed-1-6-lite-251015".to_string(),
            image_endpoint: None,
            image_model: "doubao-seedream-4-0-250828".to_string(),
        }
    }
}

impl DoubaoConfig {
    /// Key + chat endpoint present.
    pub fn vision_configured(&self) -> bool {
        is_real_key(&self.api_key) && self.chat_endpoint.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Key + image endpoint present.
    pub fn image_configured(&self) -> bool {
        is_real_key(&self.api_key) && self.image_endpoint.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// OpenAI chat completions: vision fallback only.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

impl OpenAiConfig {
    pub fn is_configured(&self) -> bool {
        is_real_key(&self.api_key)
    }
}

// ─────────────────────────────────────────────
// Retry / timeouts
// ─────────────────────────────────────────────

/// Backoff settings applied to every provider call.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 2000,
            backoff_multiplier: 2.0,
            max_delay_ms: 10_000,
        }
    }
}

/// Per-request wall-clock budgets, in seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeoutConfig {
    pub vision_secs: u64,
    pub image_secs: u64,
    pub speech_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            vision_secs: 60,
            image_secs: 120,
            speech_secs: 90,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.providers.gemini.analyze_model, "gemini-2.5-flash");
        assert_eq!(cfg.providers.openai.model, "gpt-4o-mini");
        assert_eq!(cfg.retry.max_retries, 3);
        assert_eq!(cfg.retry.max_delay_ms, 10_000);
        assert_eq!(cfg.timeouts.vision_secs, 60);
        assert!(!cfg.providers.gemini.is_configured());
        assert!(!cfg.providers.doubao.vision_configured());
    }

    #[test]
    fn test_placeholder_keys_are_not_configured() {
        assert!(!is_real_key(""));
        assert!(!is_real_key("your_api_key"));
        assert!(!is_real_key("your_gemini_key"));
        assert!(is_real_key("AIzaSyTest"));
    }

    #[test]
    fn test_doubao_needs_endpoints() {
        let mut doubao = DoubaoConfig {
            api_key: "ark-key".into(),
            ..Default::default()
        };
        assert!(!doubao.vision_configured());
        assert!(!doubao.image_configured());

        doubao.chat_endpoint = Some("https://ark.example/api/v3/chat/completions".into());
        assert!(doubao.vision_configured());
        assert!(!doubao.image_configured());

        doubao.image_endpoint = Some("https://ark.example".into());
        assert!(doubao.image_configured());
    }

    #[test]
    fn test_camel_case_round_trip() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["providers"]["gemini"].get("analyzeModel").is_some());
        assert!(json["retry"].get("initialDelayMs").is_some());
        assert!(json["providers"]["doubao"].get("chatEndpoint").is_none());
    }
}
