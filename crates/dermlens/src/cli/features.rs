//! The `dermlens features` command.

use std::path::PathBuf;

use clap::Args;
use dermlens_core::{Config, FeatureExtractor, FeatureRecord, FileDiscovery, OutputWriter};

use super::{open_output, resolve_format, OutputFormat};

/// Arguments for the `features` command.
#[derive(Args, Debug)]
pub struct FeaturesArgs {
    /// Image file or directory
    pub input: PathBuf,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to `output.format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Execute the features command.
///
/// Extraction never fails; unreadable images produce an `error` record.
pub fn execute(args: FeaturesArgs, config: &Config) -> anyhow::Result<()> {
    let mut writer = OutputWriter::new(
        open_output(args.output.as_deref())?,
        resolve_format(args.format, config),
        config.output.pretty,
    );

    if args.input.is_file() {
        let features = FeatureExtractor::extract(&args.input.as_path().into());
        writer.write(&features)?;
        writer.flush()?;
        return Ok(());
    }

    let files = FileDiscovery::new(config.limits.clone()).discover(&args.input);
    if files.is_empty() {
        anyhow::bail!("No supported images found at {}", args.input.display());
    }

    let records: Vec<FeatureRecord> = files
        .iter()
        .map(|file| FeatureRecord {
            source: file.path.display().to_string(),
            features: FeatureExtractor::extract(&file.path.as_path().into()),
        })
        .collect();
    writer.write_all(&records)?;
    writer.flush()?;

    tracing::info!("Extracted features for {} images", records.len());
    Ok(())
}
