//! Config loader: reads `~/.cinesketch/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.cinesketch/config.json`
//! 3. Environment variables `CINESKETCH_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `CINESKETCH_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `CINESKETCH_PROVIDERS__GEMINI__API_KEY` / `__API_BASE` / `__ANALYZE_MODEL` /
///   `__IMAGE_MODEL` / `__IMAGE_FALLBACK_MODEL` / `__SPEECH_MODEL`
/// - `CINESKETCH_PROVIDERS__DOUBAO__API_KEY` / `__CHAT_ENDPOINT` / `__CHAT_MODEL` /
///   `__IMAGE_ENDPOINT` / `__IMAGE_MODEL`
/// - `CINESKETCH_PROVIDERS__OPENAI__API_KEY` / `__API_BASE` / `__MODEL`
/// - `CINESKETCH_RETRY__MAX_RETRIES` / `__INITIAL_DELAY_MS` / `__BACKOFF_MULTIPLIER` /
///   `__MAX_DELAY_MS`
fn apply_env_overrides(mut config: Config) -> Config {
    apply_env_overrides_from(&mut config, |key| std::env::var(key).ok());
    config
}

/// Core of [`apply_env_overrides`], parameterized over the variable lookup so
/// tests don't have to mutate the process environment.
fn apply_env_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(&format!("CINESKETCH_{name}")).filter(|v| !v.is_empty());

    // Gemini
    let gemini = &mut config.providers.gemini;
    if let Some(val) = var("PROVIDERS__GEMINI__API_KEY") {
        gemini.api_key = val;
    }
    if let Some(val) = var("PROVIDERS__GEMINI__API_BASE") {
        gemini.api_base = val;
    }
    if let Some(val) = var("PROVIDERS__GEMINI__ANALYZE_MODEL") {
        gemini.analyze_model = val;
    }
    if let Some(val) = var("PROVIDERS__GEMINI__IMAGE_MODEL") {
        gemini.image_model = val;
    }
    if let Some(val) = var("PROVIDERS__GEMINI__IMAGE_FALLBACK_MODEL") {
        gemini.image_fallback_model = val;
    }
    if let Some(val) = var("PROVIDERS__GEMINI__SPEECH_MODEL") {
        gemini.speech_model = val;
    }

    // Doubao
    let doubao = &mut config.providers.doubao;
    if let Some(val) = var("PROVIDERS__DOUBAO__API_KEY") {
        doubao.api_key = val;
    }
    if let Some(val) = var("PROVIDERS__DOUBAO__CHAT_ENDPOINT") {
        doubao.chat_endpoint = Some(val);
    }
    if let Some(val) = var("PROVIDERS__DOUBAO__CHAT_MODEL") {
        doubao.chat_model = val;
    }
    if let Some(val) = var("PROVIDERS__DOUBAO__IMAGE_ENDPOINT") {
        doubao.image_endpoint = Some(val);
    }
    if let Some(val) = var("PROVIDERS__DOUBAO__IMAGE_MODEL") {
        doubao.image_model = val;
    }

    // OpenAI
    let openai = &mut config.providers.openai;
    if let Some(val) = var("PROVIDERS__OPENAI__API_KEY") {
        openai.api_key = val;
    }
    if let Some(val) = var("PROVIDERS__OPENAI__API_BASE") {
        openai.api_base = val;
    }
    if let Some(val) = var("PROVIDERS__OPENAI__MODEL") {
        openai.model = val;
    }

    // Retry
    if let Some(n) = var("RETRY__MAX_RETRIES").and_then(|v| v.parse::<u32>().ok()) {
        config.retry.max_retries = n;
    }
    if let Some(n) = var("RETRY__INITIAL_DELAY_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.retry.initial_delay_ms = n;
    }
    if let Some(m) = var("RETRY__BACKOFF_MULTIPLIER")
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|m| m.is_finite() && *m >= 1.0)
    {
        config.retry.backoff_multiplier = m;
    }
    if let Some(n) = var("RETRY__MAX_DELAY_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.retry.max_delay_ms = n;
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
