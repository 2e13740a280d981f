//! The `dermlens labels` command.

use clap::Args;
use dermlens_core::classify::enrichment;
use dermlens_core::scoring::CONDITION_PROMPTS;
use dermlens_core::{Config, SkinAnalyzer};

/// Arguments for the `labels` command.
#[derive(Args, Debug)]
pub struct LabelsArgs {
    /// Print full model information as JSON (loads the encoders)
    #[arg(long)]
    pub json: bool,
}

/// Execute the labels command.
pub async fn execute(args: LabelsArgs, config: Config) -> anyhow::Result<()> {
    if args.json {
        let analyzer = tokio::task::spawn_blocking(move || SkinAnalyzer::new(&config)).await??;
        println!("{}", serde_json::to_string_pretty(&analyzer.model_info())?);
        return Ok(());
    }

    println!(
        "Backend: {}  Model: {}  Dim: {}  Temperature: {}  Min confidence: {}",
        config.embedding.backend,
        config.embedding.model,
        config.embedding.embedding_dim,
        config.scoring.temperature,
        config.scoring.min_confidence
    );
    println!();
    println!("{:<24} {:<10} PROMPT", "LABEL", "ENRICHED");
    for condition in CONDITION_PROMPTS {
        let enriched = if enrichment::lookup(condition.label).is_some() {
            "yes"
        } else {
            "fallback"
        };
        println!("{:<24} {:<10} {}", condition.label, enriched, condition.prompt);
    }
    Ok(())
}
