//! Cinesketch CLI: entry point.
//!
//! # Commands
//!
//! - `cinesketch analyze <IMAGE>`: three cinematic ideas for a sketch
//! - `cinesketch generate --prompt ...`: render a scene
//! - `cinesketch edit <IMAGE> --instruction ...`: edit or composite a scene
//! - `cinesketch plan-edit <IMAGE> --input ...`: optimized edit prompt + properties
//! - `cinesketch voice recommend|speak`: voice casting and speech
//! - `cinesketch ambience describe|audio`: scene soundscape
//! - `cinesketch onboard` / `cinesketch status`

mod helpers;
mod onboard;
mod status;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use cinesketch_core::config::load_config;
use cinesketch_core::ImageSize;
use cinesketch_studio::{EditRequest, SceneImage, SceneRequest, SpeechClip, Studio};

use crate::helpers::provider_failure;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🎬 Cinesketch: turn sketches into cinematic scenes, voices, and soundscapes
#[derive(Parser)]
#[command(name = "cinesketch", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret a sketch as three cinematic scene ideas
    Analyze {
        /// Sketch image file
        image: String,
    },

    /// Render a scene from a prompt
    Generate {
        #[arg(short, long)]
        prompt: String,

        /// Image model, or "doubao" for Doubao Seedream
        #[arg(short, long)]
        model: Option<String>,

        /// Output size tier: 1K, 2K or 4K
        #[arg(long, default_value = "2K")]
        size: ImageSize,

        /// Reference image guiding the render
        #[arg(short, long)]
        reference: Option<String>,

        #[arg(short, long)]
        temperature: Option<f64>,

        /// Where to save the image
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Edit a scene, optionally compositing in a second image
    Edit {
        image: String,

        #[arg(short, long, default_value = "")]
        instruction: String,

        /// Reference element to blend into the scene
        #[arg(short, long)]
        blend: Option<String>,

        #[arg(short, long)]
        model: Option<String>,

        #[arg(long, default_value = "2K")]
        size: ImageSize,

        #[arg(short, long)]
        output: Option<String>,
    },

    /// Turn a loose edit request into an optimized prompt and adjustable properties
    PlanEdit {
        image: String,

        /// What you want changed
        #[arg(short, long)]
        input: String,

        #[arg(short, long)]
        blend: Option<String>,
    },

    /// Voice casting and speech synthesis
    Voice {
        #[command(subcommand)]
        action: VoiceCommands,
    },

    /// Scene soundscape description and audio
    Ambience {
        #[command(subcommand)]
        action: AmbienceCommands,
    },

    /// Initialize configuration
    Onboard,

    /// Show configuration and provider status
    Status,
}

#[derive(Subcommand)]
enum VoiceCommands {
    /// Pick a voice for a character and line of dialogue
    Recommend {
        image: String,

        #[arg(short, long)]
        text: String,
    },

    /// Speak a line with a prebuilt voice
    Speak {
        #[arg(short, long)]
        text: String,

        /// Puck, Charon, Kore, Fenrir or Zephyr
        #[arg(short, long, default_value = "Kore")]
        voice: String,

        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
enum AmbienceCommands {
    /// Describe what a scene sounds like
    Describe { image: String },

    /// Narrate an ambience description as audio
    Audio {
        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        output: Option<String>,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    match cli.command {
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run(),
        command => run_studio(command).await,
    }
}

async fn run_studio(command: Commands) -> Result<()> {
    let config = load_config(None);
    let studio = Studio::new(config).context("failed to initialize providers")?;

    match command {
        Commands::Analyze { image } => analyze(&studio, &image).await,
        Commands::Generate {
            prompt,
            model,
            size,
            reference,
            temperature,
            output,
        } => {
            let scene = SceneRequest {
                prompt,
                model,
                size,
                reference_image: reference.as_deref().map(helpers::read_image).transpose()?,
                temperature,
            };
            let image = studio
                .generate_scene(&scene)
                .await
                .map_err(|e| provider_failure(e, "scene generation"))?;
            print_scene("Scene", &image, output.as_deref())
        }
        Commands::Edit {
            image,
            instruction,
            blend,
            model,
            size,
            output,
        } => {
            let edit = EditRequest {
                image: helpers::read_image(&image)?,
                instruction,
                blend_image: blend.as_deref().map(helpers::read_image).transpose()?,
                model,
                size,
            };
            let image = studio
                .edit_scene(&edit)
                .await
                .map_err(|e| provider_failure(e, "scene edit"))?;
            print_scene("Edited scene", &image, output.as_deref())
        }
        Commands::PlanEdit { image, input, blend } => {
            let base = helpers::read_image(&image)?;
            let blend = blend.as_deref().map(helpers::read_image).transpose()?;
            let plan = studio
                .analyze_edit_prompt(&input, &base, blend.as_deref())
                .await
                .map_err(|e| provider_failure(e, "edit planning"))?;

            helpers::print_header("Edit Plan");
            println!("  {}", plan.optimized_prompt);
            println!();
            for prop in &plan.properties {
                println!(
                    "    {:<14} {:<16} {}",
                    prop.category.dimmed(),
                    prop.name.bold(),
                    prop.value
                );
            }
            println!();
            helpers::print_usage(&plan.usage);
            Ok(())
        }
        Commands::Voice { action } => match action {
            VoiceCommands::Recommend { image, text } => {
                let image = helpers::read_image(&image)?;
                let rec = studio
                    .recommend_voice(&image, &text)
                    .await
                    .map_err(|e| provider_failure(e, "voice casting"))?;

                helpers::print_header("Voice");
                println!("  {} {}", rec.voice_name.bold(), format!("({})", rec.reason).dimmed());
                println!();
                helpers::print_usage(&rec.usage);
                Ok(())
            }
            VoiceCommands::Speak { text, voice, output } => {
                let clip = studio
                    .synthesize_speech(&text, &voice)
                    .await
                    .map_err(|e| provider_failure(e, "speech synthesis"))?;
                save_clip("Speech", "speech", &clip, output.as_deref())
            }
        },
        Commands::Ambience { action } => match action {
            AmbienceCommands::Describe { image } => {
                let image = helpers::read_image(&image)?;
                let ambience = studio
                    .describe_ambience(&image)
                    .await
                    .map_err(|e| provider_failure(e, "ambience description"))?;

                helpers::print_header("Ambience");
                println!("  {}", ambience.description.italic());
                println!();
                helpers::print_usage(&ambience.usage);
                Ok(())
            }
            AmbienceCommands::Audio { description, output } => {
                let clip = studio
                    .synthesize_ambience_audio(&description)
                    .await
                    .map_err(|e| provider_failure(e, "ambience audio"))?;
                save_clip("Ambience Audio", "ambience", &clip, output.as_deref())
            }
        },
        Commands::Onboard | Commands::Status => Ok(()),
    }
}

// ─────────────────────────────────────────────
// Command output
// ─────────────────────────────────────────────

async fn analyze(studio: &Studio, image: &str) -> Result<()> {
    let image = helpers::read_image(image)?;
    let analysis = studio
        .analyze_sketch(&image)
        .await
        .map_err(|e| provider_failure(e, "sketch analysis"))?;

    helpers::print_header("Scene Ideas");
    for (i, idea) in analysis.ideas.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).cyan(), idea.title.bold());
        println!("     {}", idea.description);
        println!("     {}", idea.technical_prompt.dimmed());
        println!();
    }
    helpers::print_usage(&analysis.usage);
    Ok(())
}

fn print_scene(title: &str, image: &SceneImage, output: Option<&str>) -> Result<()> {
    helpers::print_header(title);
    println!("  {:<8} {}", "Model:".bold(), image.model);

    if image.image_url.starts_with("data:") {
        let (mime, bytes) = helpers::decode_data_url(&image.image_url)?;
        let path = helpers::output_file(output, "scene", helpers::extension_for(&mime));
        helpers::write_file(&path, &bytes)?;
        helpers::print_saved(&path);
        info!(path = %path.display(), bytes = bytes.len(), "Image saved");
    } else {
        println!("  {:<8} {}", "URL:".bold(), image.image_url.underline());
    }

    println!();
    helpers::print_usage(&image.usage);
    Ok(())
}

fn save_clip(title: &str, stem: &str, clip: &SpeechClip, output: Option<&str>) -> Result<()> {
    let path = helpers::output_file(output, stem, "wav");
    helpers::write_file(&path, &clip.to_wav())?;

    helpers::print_header(title);
    helpers::print_saved(&path);
    println!();
    helpers::print_usage(&clip.usage);
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("cinesketch=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
