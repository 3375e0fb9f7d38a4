//! `cinesketch onboard`: initialize configuration and the output directory.
//!
//! - Creates `~/.cinesketch/config.json` with defaults
//! - Creates `~/.cinesketch/output/` for generated images and audio
//! - Lists where to get keys for each provider

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use cinesketch_core::config::{get_config_path, load_config, save_config};
use cinesketch_core::utils::get_output_path;
use cinesketch_providers::registry::PROVIDERS;

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "🎬 Cinesketch Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    let output_dir = get_output_path();
    let created = setup(&config_path, &output_dir)?;

    if created {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!("  {} config already exists at {}", "✓".green(), config_path.display());
    }
    println!("  {} output dir at {}", "✓".green(), output_dir.display());

    println!();
    println!("  {}", "Add API keys under providers.<name>.apiKey:".bold());
    for spec in PROVIDERS {
        let capabilities: Vec<&str> = spec.capabilities.iter().map(|c| c.label()).collect();
        println!(
            "    {:<10} {} {}",
            spec.name,
            spec.signup_url.underline(),
            format!("({})", capabilities.join(", ")).dimmed()
        );
    }

    println!();
    println!("{}", "  Setup complete! Run `cinesketch status` to check providers.".green());
    println!();

    Ok(())
}

/// Write a default config (if none exists) and ensure the output directory.
/// Returns whether a new config file was written.
fn setup(config_path: &Path, output_dir: &Path) -> Result<bool> {
    let created = if config_path.exists() {
        false
    } else {
        // Defaults plus whatever the environment already provides
        let config = load_config(Some(config_path));
        save_config(&config, Some(config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        true
    };

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    Ok(created)
}
