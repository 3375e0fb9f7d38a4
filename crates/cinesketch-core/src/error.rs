//! Error taxonomy for provider calls.
//!
//! Every adapter failure is reported as a [`ProviderError`]. The retrier and the
//! fallback chain never look at message text directly; they ask the error for its
//! [`Disposition`] (retry, advance, or stop) and callers ask for its [`ErrorKind`].

use serde::Serialize;
use thiserror::Error;

/// Substrings that mark a failure as transient even when no status code survived
/// (SDK-style messages, proxies that rewrite bodies, etc.).
const TRANSIENT_MARKERS: &[&str] = &[
    "overloaded",
    "UNAVAILABLE",
    "fetch failed",
    "ECONNREFUSED",
    "ETIMEDOUT",
    "ENOTFOUND",
];

/// What a single attempt's failure means for the caller.
///
/// Mirrors the attempt outcome tags: a successful attempt is simply `Ok(..)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Likely to succeed if the same request is sent again.
    Retryable,
    /// Certain to recur; stop.
    Fatal,
    /// The candidate (provider + model) cannot serve this request; try the next one.
    Unsupported,
}

/// Stable, serializable category reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transient,
    Unsupported,
    Auth,
    ContentRejection,
    Parse,
    Http,
    Exhausted,
}

/// A failure talking to (or interpreting output from) an AI provider.
#[derive(Clone, Debug, Error)]
pub enum ProviderError {
    /// Required credential or endpoint missing. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Rate limited (429) or overloaded/unavailable (503).
    #[error("{provider} temporarily unavailable ({status}): {message}")]
    Transient {
        provider: String,
        status: u16,
        message: String,
    },

    /// The request exceeded its wall-clock budget.
    #[error("{provider} request timed out after {secs}s")]
    Timeout { provider: String, secs: u64 },

    /// Connection refused, DNS failure, reset, etc.
    #[error("network error calling {provider}: {message}")]
    Network { provider: String, message: String },

    /// Model or endpoint not available on this provider (404 / "not found").
    #[error("{provider} cannot serve model '{model}': {message}")]
    Unsupported {
        provider: String,
        model: String,
        status: Option<u16>,
        message: String,
    },

    /// 401/403. Never retried.
    #[error("{provider} rejected the credentials ({status}): {message}")]
    Auth {
        provider: String,
        status: u16,
        message: String,
    },

    /// The provider answered but produced nothing usable (no image, no audio, empty text).
    #[error("{provider} returned no usable output: {reason}")]
    ContentRejection { provider: String, reason: String },

    /// Structured output could not be recovered from model text.
    #[error("no valid JSON found in response (preview: {preview})")]
    Parse { preview: String },

    /// Any other non-success HTTP status or malformed response body.
    #[error("{provider} API error ({status}): {message}")]
    Http {
        provider: String,
        status: u16,
        message: String,
    },

    /// Every candidate of a fallback chain failed.
    #[error("all providers failed for {operation} (tried: {}); last error: {last}", .attempted.join(", "))]
    Exhausted {
        operation: String,
        attempted: Vec<String>,
        last: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Shorthand for a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        ProviderError::Configuration(msg.into())
    }

    /// Shorthand for a content rejection.
    pub fn rejected(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        ProviderError::ContentRejection {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// How the retrier and fallback chain should treat this failure.
    pub fn disposition(&self) -> Disposition {
        match self {
            ProviderError::Transient { .. }
            | ProviderError::Timeout { .. }
            | ProviderError::Network { .. } => Disposition::Retryable,
            ProviderError::Unsupported { .. } => Disposition::Unsupported,
            ProviderError::Http { status, message, .. } => {
                if matches!(status, 429 | 503) || mentions_transient(message) {
                    Disposition::Retryable
                } else {
                    Disposition::Fatal
                }
            }
            ProviderError::Configuration(_)
            | ProviderError::Auth { .. }
            | ProviderError::ContentRejection { .. }
            | ProviderError::Parse { .. }
            | ProviderError::Exhausted { .. } => Disposition::Fatal,
        }
    }

    /// Category reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Configuration(_) => ErrorKind::Configuration,
            ProviderError::Transient { .. }
            | ProviderError::Timeout { .. }
            | ProviderError::Network { .. } => ErrorKind::Transient,
            ProviderError::Unsupported { .. } => ErrorKind::Unsupported,
            ProviderError::Auth { .. } => ErrorKind::Auth,
            ProviderError::ContentRejection { .. } => ErrorKind::ContentRejection,
            ProviderError::Parse { .. } => ErrorKind::Parse,
            ProviderError::Http { .. } => ErrorKind::Http,
            ProviderError::Exhausted { .. } => ErrorKind::Exhausted,
        }
    }

    /// HTTP status observed from the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Transient { status, .. }
            | ProviderError::Auth { status, .. }
            | ProviderError::Http { status, .. } => Some(*status),
            ProviderError::Unsupported { status, .. } => *status,
            ProviderError::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Network/availability failure (worth a "try again" prompt) as opposed to a
    /// permanent or content failure.
    pub fn is_availability(&self) -> bool {
        match self {
            ProviderError::Exhausted { last, .. } => last.is_availability(),
            other => other.disposition() == Disposition::Retryable,
        }
    }

    /// Status a route handler should answer with: 503 for availability
    /// failures, 500 for everything else.
    pub fn http_status_hint(&self) -> u16 {
        if self.is_availability() {
            503
        } else {
            500
        }
    }
}

fn mentions_transient(message: &str) -> bool {
    TRANSIENT_MARKERS.iter().any(|m| message.contains(m))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
