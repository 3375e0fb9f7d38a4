//! Structured-output recovery from model text.
//!
//! Language models wrap JSON in prose, code fences, or encode it twice. The
//! extractor runs an ordered list of strategies and keeps the first one that
//! yields valid JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use cinesketch_core::ProviderError;

/// A single recovery attempt.
pub type Strategy = fn(&str) -> Option<Value>;

/// Strategies in the order they are tried.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", direct),
    ("strip_fences", strip_fences),
    ("first_array", first_array),
    ("first_object", first_object),
];

const PREVIEW_CHARS: usize = 200;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```[A-Za-z]*\s*([\s\S]*?)```").expect("valid fence regex")
});
static ARRAY_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\s\S]*\]").expect("valid array regex"));
static OBJECT_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid object regex"));

/// Recover a JSON value from free text.
pub fn extract_json(text: &str) -> Result<Value, ProviderError> {
    if text.trim().is_empty() {
        return Err(ProviderError::Parse {
            preview: String::new(),
        });
    }

    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(text) {
            debug!(strategy = name, "Extracted JSON from model output");
            return Ok(value);
        }
    }

    Err(ProviderError::Parse {
        preview: text.chars().take(PREVIEW_CHARS).collect(),
    })
}

/// Locate the array of records inside an extracted value.
///
/// JSON-mode endpoints can't return a top-level array, so models wrap it:
/// `{"ideas": [...]}`, `{"scenes": [...]}`, or some other key.
pub fn find_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => ["ideas", "scenes"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .or_else(|| map.values().find_map(Value::as_array)),
        _ => None,
    }
}

// ─────────────────────────────────────────────
// Strategies
// ─────────────────────────────────────────────

/// Parse the trimmed text as-is, unwrapping a double-encoded object.
pub fn direct(text: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    match value {
        Value::String(inner) if inner.trim_start().starts_with('{') => {
            Some(serde_json::from_str(inner.trim()).unwrap_or(Value::String(inner)))
        }
        other => Some(other),
    }
}

/// Remove markdown code fences and a leading `json` token, then parse.
pub fn strip_fences(text: &str) -> Option<Value> {
    direct(&without_fences(text))
}

/// First `[` through last `]` of the fence-stripped text.
pub fn first_array(text: &str) -> Option<Value> {
    let stripped = without_fences(text);
    let m = ARRAY_LITERAL.find(&stripped)?;
    serde_json::from_str(m.as_str()).ok()
}

/// First `{` through last `}` of the fence-stripped text.
pub fn first_object(text: &str) -> Option<Value> {
    let stripped = without_fences(text);
    let m = OBJECT_LITERAL.find(&stripped)?;
    serde_json::from_str(m.as_str()).ok()
}

fn without_fences(text: &str) -> String {
    let body = match FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().to_string(),
        None => text.replace("```json", "").replace("```", ""),
    };

    let body = body.trim();
    match body.strip_prefix("json") {
        Some(rest) if rest.starts_with(|c: char| c.is_whitespace() || c == '[' || c == '{') => {
            rest.trim().to_string()
        }
        _ => body.to_string(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
