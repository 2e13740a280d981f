//! DermLens CLI - zero-shot skin condition triage from a single photograph.
//!
//! Ranks candidate skin conditions for an image with confidence, severity
//! and a clinical-attention flag, and reports handcrafted visual features.
//!
//! # Usage
//!
//! ```bash
//! # Analyze a single image
//! dermlens analyze lesion.jpg
//!
//! # Analyze a directory
//! dermlens analyze ./photos/ --output results.jsonl --format jsonl
//!
//! # Check an image before analysis
//! dermlens validate lesion.jpg
//!
//! # Visual features only
//! dermlens features lesion.jpg
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// DermLens - zero-shot skin condition triage from a single photograph.
#[derive(Parser, Debug)]
#[command(name = "dermlens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze images and rank candidate skin conditions
    Analyze(cli::analyze::AnalyzeArgs),

    /// Check whether an image can be analyzed
    Validate(cli::validate::ValidateArgs),

    /// Extract color, texture, shape and symmetry features
    Features(cli::features::FeaturesArgs),

    /// Show the condition labels, their prompts and model information
    Labels(cli::labels::LabelsArgs),

    /// Inspect installed encoder files
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match dermlens_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `dermlens config path`."
            );
            dermlens_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("DermLens v{}", dermlens_core::VERSION);

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args, config).await,
        Commands::Validate(args) => cli::validate::execute(args, &config),
        Commands::Features(args) => cli::features::execute(args, &config),
        Commands::Labels(args) => cli::labels::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, &config),
        Commands::Config(args) => cli::config::execute(args),
    }
}
