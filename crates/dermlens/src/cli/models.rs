//! The `dermlens models` command for inspecting encoder files.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use dermlens_core::embedding::VISUAL_MODEL_FILENAME;
use dermlens_core::scoring::text_encoder::{TEXT_MODEL_FILENAME, TOKENIZER_FILENAME};
use dermlens_core::Config;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model inspection.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List the encoder files for the configured model
    List,

    /// Show the encoder directory path
    Path,
}

/// Files an ONNX encoder directory must contain.
const REQUIRED_FILES: &[&str] = &[VISUAL_MODEL_FILENAME, TEXT_MODEL_FILENAME, TOKENIZER_FILENAME];

/// State of one encoder file on disk.
#[derive(Debug, PartialEq, Eq)]
pub struct ModelFile {
    pub name: &'static str,
    pub path: PathBuf,
    /// Size and BLAKE3 digest, or `None` when missing
    pub details: Option<(u64, String)>,
}

/// Inspect every required file in an encoder directory.
pub fn inspect(encoder_dir: &Path) -> anyhow::Result<Vec<ModelFile>> {
    REQUIRED_FILES
        .iter()
        .map(|name| -> anyhow::Result<ModelFile> {
            let path = encoder_dir.join(name);
            let details = if path.is_file() {
                let bytes = std::fs::read(&path)?;
                Some((bytes.len() as u64, blake3::hash(&bytes).to_hex().to_string()))
            } else {
                None
            };
            Ok(ModelFile {
                name: *name,
                path,
                details,
            })
        })
        .collect()
}

/// Execute the models command.
pub fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    let encoder_dir = config.encoder_dir();

    match args.command {
        ModelsCommand::List => {
            println!(
                "Model: {} ({} backend configured)",
                config.embedding.model, config.embedding.backend
            );
            println!("Directory: {}", encoder_dir.display());
            println!();

            let files = inspect(&encoder_dir)?;
            for file in &files {
                match &file.details {
                    Some((size, digest)) => println!(
                        "  [ok]      {:<18} {:>10} bytes  blake3:{}",
                        file.name, size, digest
                    ),
                    None => println!("  [missing] {}", file.name),
                }
            }

            if files.iter().any(|f| f.details.is_none()) {
                println!();
                println!(
                    "The onnx backend needs all files above. Export them into {}",
                    encoder_dir.display()
                );
            }
        }

        ModelsCommand::Path => {
            println!("{}", encoder_dir.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_reports_missing_and_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TOKENIZER_FILENAME), b"{}").unwrap();

        let files = inspect(dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files[0].details.is_none());
        assert!(files[1].details.is_none());

        let (size, digest) = files[2].details.as_ref().unwrap();
        assert_eq!(*size, 2);
        assert_eq!(digest, &blake3::hash(b"{}").to_hex().to_string());
    }
}
