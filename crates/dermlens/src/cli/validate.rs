//! The `dermlens validate` command.

use std::path::PathBuf;

use clap::Args;
use dermlens_core::pipeline::Validator;
use dermlens_core::{Config, ImageSource};

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Image file to check
    pub input: PathBuf,
}

/// Execute the validate command.
///
/// Prints the validation report and fails when the image is rejected.
pub fn execute(args: ValidateArgs, config: &Config) -> anyhow::Result<()> {
    let validator = Validator::new(config.limits.clone());
    let report = validator.validate(&ImageSource::from(args.input.as_path()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    match report.reason {
        Some(reason) => anyhow::bail!("{}: {}", args.input.display(), reason),
        None => Ok(()),
    }
}
