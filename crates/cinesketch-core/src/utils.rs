//! Utility helpers: path resolution, timestamps, string and payload cleanup.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

static DATA_URL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:image/[A-Za-z0-9.+-]+;base64,").expect("valid data-url regex")
});

/// Get the Cinesketch data directory (e.g. `~/.cinesketch/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cinesketch")
}

/// Get the default output directory for generated media (e.g. `~/.cinesketch/output/`).
pub fn get_output_path() -> PathBuf {
    get_data_path().join("output")
}

/// Milliseconds since the Unix epoch, used to make generated ids unique.
pub fn timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Strip a leading `data:image/<type>;base64,` prefix, leaving raw base64.
pub fn strip_data_url(data: &str) -> &str {
    match DATA_URL_PREFIX.find(data) {
        Some(m) => &data[m.end()..],
        None => data,
    }
}

/// Mask a secret for display: keep a short prefix, hide the rest.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let prefix: String = secret.chars().take(6).collect();
    format!("{prefix}…")
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
