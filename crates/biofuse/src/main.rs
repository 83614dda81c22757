use std::path::PathBuf;

use anyhow::{Context, Result};
use biofuse_core::FusionConfig;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod commands;
use commands::decode::{handle_decode_command, DecodeArgs};
use commands::discover::handle_discover_command;
use commands::run::{handle_run_command, RunArgs};

/// Fuses per-day CO₂ logs with wearable heart-rate archives.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults are used when absent.
    #[arg(long, global = true, env = "BIOFUSE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode, normalise, join and write every selected day.
    Run(RunArgs),
    /// List discovered days and the files matched for each.
    Discover,
    /// Decode a single file and print what was recovered.
    Decode(DecodeArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Run(args) => handle_run_command(config, args),
        Command::Discover => handle_discover_command(&config.expand_home()),
        Command::Decode(args) => handle_decode_command(args),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<FusionConfig> {
    // `~` is expanded by each command, after flag overrides are applied.
    let config = match path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            FusionConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
        None => {
            debug!("no configuration file given; using defaults");
            FusionConfig::default()
        }
    };
    Ok(config)
}
