//! Transient-error classification.
//!
//! Turns raw HTTP/transport failures into typed [`ProviderError`]s, and exposes
//! the shared `is_transient` predicate the retrier uses.

use cinesketch_core::{Disposition, ProviderError};

/// Maximum characters of a provider error body kept in messages.
pub const MAX_ERROR_CHARS: usize = 500;

/// Classify a non-success HTTP response.
///
/// - 401/403 → `Auth`
/// - 404, or a message containing "not found" → `Unsupported`
/// - 429, 503, "UNAVAILABLE", "overloaded" → `Transient`
/// - anything else → `Http`
pub fn classify_status(provider: &str, model: &str, status: u16, body: &str) -> ProviderError {
    let message = error_message(body);
    let provider = provider.to_string();

    match status {
        401 | 403 => ProviderError::Auth {
            provider,
            status,
            message,
        },
        404 => ProviderError::Unsupported {
            provider,
            model: model.to_string(),
            status: Some(status),
            message,
        },
        429 | 503 => ProviderError::Transient {
            provider,
            status,
            message,
        },
        _ if message.to_lowercase().contains("not found") => ProviderError::Unsupported {
            provider,
            model: model.to_string(),
            status: Some(status),
            message,
        },
        _ if message.contains("UNAVAILABLE") || message.contains("overloaded") => {
            ProviderError::Transient {
                provider,
                status,
                message,
            }
        }
        _ => ProviderError::Http {
            provider,
            status,
            message,
        },
    }
}

/// Classify a failure that happened before any response arrived.
pub fn classify_transport(provider: &str, timeout_secs: u64, err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
            secs: timeout_secs,
        }
    } else {
        ProviderError::Network {
            provider: provider.to_string(),
            message: clip(&err.to_string()),
        }
    }
}

/// Shared retry predicate.
pub fn is_transient(err: &ProviderError) -> bool {
    err.disposition() == Disposition::Retryable
}

/// Pull a human-readable message out of an error body.
///
/// Prefers a JSON `error.message` (Gemini, OpenAI, Ark all use it), falls back
/// to the raw body. Truncated to [`MAX_ERROR_CHARS`].
pub fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str().map(String::from))
        })
        .filter(|m| !m.is_empty());

    clip(from_json.as_deref().unwrap_or(body))
}

fn clip(s: &str) -> String {
    s.chars().take(MAX_ERROR_CHARS).collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
