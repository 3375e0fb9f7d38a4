//! `cinesketch status`: show configuration and per-capability provider status.

use anyhow::Result;
use colored::Colorize;

use cinesketch_core::config::{get_config_path, load_config, Config};
use cinesketch_core::utils::mask_secret;
use cinesketch_core::ProviderId;
use cinesketch_providers::registry::{is_configured_for, PROVIDERS};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "🎬 Cinesketch Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    let gemini = &config.providers.gemini;
    println!("  {:<18} {}", "Analyze model:".bold(), gemini.analyze_model);
    println!(
        "  {:<18} {} {}",
        "Image models:".bold(),
        gemini.image_model,
        format!("(fallback: {})", gemini.image_fallback_model).dimmed()
    );
    println!("  {:<18} {}", "Speech model:".bold(), gemini.speech_model);

    let retry = &config.retry;
    println!(
        "  {:<18} {}",
        "Retry:".bold(),
        format!(
            "{} retries, {}ms ×{} up to {}ms",
            retry.max_retries, retry.initial_delay_ms, retry.backoff_multiplier, retry.max_delay_ms
        )
        .dimmed()
    );

    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let capabilities: Vec<String> = spec
            .capabilities
            .iter()
            .map(|cap| {
                if is_configured_for(&config, spec.id, *cap) {
                    format!("{} {}", "✓".green(), cap.label())
                } else {
                    format!("{}", format!("· {}", cap.label()).dimmed())
                }
            })
            .collect();
        let key = match mask_secret(api_key(&config, spec.id)) {
            masked if masked.is_empty() => "(no key)".dimmed().to_string(),
            masked => masked.dimmed().to_string(),
        };
        println!("    {:<10} {:<12} {}", spec.display_name(), key, capabilities.join("  "));
    }

    println!();
    Ok(())
}

fn api_key(config: &Config, id: ProviderId) -> &str {
    match id {
        ProviderId::Gemini => &config.providers.gemini.api_key,
        ProviderId::Doubao => &config.providers.doubao.api_key,
        ProviderId::OpenAi => &config.providers.openai.api_key,
    }
}
