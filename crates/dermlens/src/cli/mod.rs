//! Subcommand implementations and the pieces they share.

pub mod analyze;
pub mod config;
pub mod features;
pub mod labels;
pub mod models;
pub mod validate;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use clap::ValueEnum;
use dermlens_core::config::EncoderBackend;
use dermlens_core::Config;

/// Output format for analysis and feature reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<OutputFormat> for dermlens_core::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => dermlens_core::OutputFormat::Json,
            OutputFormat::Jsonl => dermlens_core::OutputFormat::JsonLines,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// The `--format` flag if given, else `output.format` from the config.
pub fn resolve_format(flag: Option<OutputFormat>, config: &Config) -> dermlens_core::OutputFormat {
    match flag {
        Some(format) => format.into(),
        None => dermlens_core::OutputFormat::parse(&config.output.format).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown output.format {:?} in config, using json",
                config.output.format
            );
            dermlens_core::OutputFormat::Json
        }),
    }
}

/// Encoder backend selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Deterministic stand-in encoders, no model files needed
    Projection,
    /// ONNX vision and text encoders from the model directory
    Onnx,
}

impl From<Backend> for EncoderBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Projection => EncoderBackend::Projection,
            Backend::Onnx => EncoderBackend::Onnx,
        }
    }
}

/// Open the output destination: a buffered file, or stdout.
pub fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Box::new(BufWriter::new(File::create(path)?)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Create a progress bar for directory runs.
pub fn create_progress_bar(total: u64) -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_maps_to_core() {
        assert_eq!(
            dermlens_core::OutputFormat::from(OutputFormat::Jsonl),
            dermlens_core::OutputFormat::JsonLines
        );
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_format_falls_back_to_config() {
        let mut config = Config::default();
        assert_eq!(
            resolve_format(None, &config),
            dermlens_core::OutputFormat::Json
        );

        config.output.format = "jsonl".into();
        assert_eq!(
            resolve_format(None, &config),
            dermlens_core::OutputFormat::JsonLines
        );
        assert_eq!(
            resolve_format(Some(OutputFormat::Json), &config),
            dermlens_core::OutputFormat::Json
        );

        config.output.format = "yaml".into();
        assert_eq!(
            resolve_format(None, &config),
            dermlens_core::OutputFormat::Json
        );
    }

    #[test]
    fn test_backend_maps_to_core() {
        assert_eq!(EncoderBackend::from(Backend::Onnx), EncoderBackend::Onnx);
        assert_eq!(
            EncoderBackend::from(Backend::Projection),
            EncoderBackend::Projection
        );
    }

    #[test]
    fn test_open_output_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.jsonl");
        {
            let mut out = open_output(Some(&path)).unwrap();
            writeln!(out, "{{}}").unwrap();
            out.flush().unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
