//! Shared CLI helpers: path expansion, image/audio file I/O, result printing.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use colored::Colorize;

use cinesketch_core::utils::{get_output_path, timestamp_millis};
use cinesketch_core::{ProviderError, UsageRecord};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Read an image file as base64.
pub fn read_image(path: &str) -> Result<String> {
    let path = expand_tilde(path);
    let bytes = std::fs::read(&path).with_context(|| format!("failed to read image: {}", path.display()))?;
    if bytes.is_empty() {
        bail!("image file is empty: {}", path.display());
    }
    Ok(BASE64.encode(bytes))
}

/// Decode a `data:<mime>;base64,<payload>` URL into (mime, bytes).
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:").context("not a data: URL")?;
    let (meta, payload) = rest.split_once(',').context("malformed data: URL")?;
    let mime = meta.strip_suffix(";base64").context("data: URL is not base64")?;
    let bytes = BASE64.decode(payload).context("invalid base64 payload")?;
    Ok((mime.to_string(), bytes))
}

/// File extension for an image MIME type.
pub fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Resolve the output file: the user's choice, or `~/.cinesketch/output/<stem>-<millis>.<ext>`.
pub fn output_file(explicit: Option<&str>, stem: &str, ext: &str) -> PathBuf {
    match explicit {
        Some(path) => expand_tilde(path),
        None => get_output_path().join(format!("{stem}-{}.{ext}", timestamp_millis())),
    }
}

/// Write bytes, creating parent directories.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

/// Attach a human hint to a provider failure: availability problems are worth retrying.
pub fn provider_failure(err: ProviderError, what: &str) -> anyhow::Error {
    let hint = if err.is_availability() {
        "provider unavailable, try again later"
    } else {
        "not retryable"
    };
    anyhow::Error::new(err).context(format!("{what} failed ({hint})"))
}

pub fn print_header(title: &str) {
    println!();
    println!("{}", format!("🎬 {title}").cyan().bold());
    println!();
}

pub fn print_usage(usage: &UsageRecord) {
    println!(
        "  {} {} in / {} out / {} total · {}",
        "Usage:".dimmed(),
        usage.input_tokens,
        usage.output_tokens,
        usage.total_tokens,
        usage.estimated_cost.yellow()
    );
    println!();
}

pub fn print_saved(path: &Path) {
    println!("  {} saved {}", "✓".green(), path.display());
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde("~/foo/bar");
        assert!(result.ends_with("foo/bar"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        assert_eq!(expand_tilde("/absolute/path"), PathBuf::from("/absolute/path"));
        assert_eq!(expand_tilde("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    fn decode_data_url_roundtrip() {
        let (mime, bytes) = decode_data_url("data:image/jpeg;base64,SU1H").unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(bytes, b"IMG");
        assert_eq!(extension_for(&mime), "jpg");
    }

    #[test]
    fn decode_data_url_rejects_http() {
        assert!(decode_data_url("https://cdn.example/a.png").is_err());
        assert!(decode_data_url("data:image/png,raw").is_err());
    }

    #[test]
    fn read_and_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("sketch.png");
        std::fs::write(&image, b"IMG").unwrap();
        assert_eq!(read_image(image.to_str().unwrap()).unwrap(), "SU1H");

        let empty = dir.path().join("empty.png");
        std::fs::write(&empty, b"").unwrap();
        assert!(read_image(empty.to_str().unwrap()).is_err());

        let nested = dir.path().join("out/clips/a.wav");
        write_file(&nested, b"RIFF").unwrap();
        assert_eq!(std::fs::read(&nested).unwrap(), b"RIFF");
    }

    #[test]
    fn output_file_default_location() {
        let path = output_file(None, "scene", "png");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("scene-") && name.ends_with(".png"));
        assert_eq!(output_file(Some("/tmp/x.wav"), "speech", "wav"), PathBuf::from("/tmp/x.wav"));
    }

    #[test]
    fn provider_failure_hint() {
        let err = provider_failure(
            ProviderError::Network {
                provider: "Gemini".into(),
                message: "connection refused".into(),
            },
            "sketch analysis",
        );
        assert!(err.to_string().contains("try again"));
    }
}
