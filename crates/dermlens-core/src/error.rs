//! Error types for the dermlens analysis pipeline.
//!
//! Errors are organized by stage so a failure names where it happened and
//! which file it concerns. Expected validation outcomes are *not* errors:
//! they travel as [`ValidationFailure`] inside a negative
//! [`ValidationReport`](crate::pipeline::ValidationReport).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for dermlens operations.
#[derive(Error, Debug)]
pub enum DermError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Decode or resize failed after validation had passed
    #[error("Preprocessing failed for {path}: {message}")]
    Preprocess { path: PathBuf, message: String },

    /// Image embedding failed
    #[error("Embedding failed for {path}: {message}")]
    Embedding { path: PathBuf, message: String },

    /// Similarity scoring failed
    #[error("Scoring failed: {message}")]
    Scoring { message: String },

    /// Model loading or text encoding failed
    #[error("Model error: {message}")]
    Model { message: String },

    /// Unexpected I/O failure while reading an input
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Why an image was rejected by validation.
///
/// These are expected outcomes, returned inside a negative report rather
/// than raised.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValidationFailure {
    #[error("Image file not found")]
    NotFound,

    #[error("Image size ({size} bytes) exceeds maximum allowed size ({max} bytes)")]
    Oversize { size: u64, max: u64 },

    #[error("Unsupported image format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid image file: {message}")]
    CorruptImage { message: String },
}

impl ValidationFailure {
    /// Stable machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Oversize { .. } => "oversize",
            Self::UnsupportedFormat { .. } => "unsupported-format",
            Self::CorruptImage { .. } => "corrupt-image",
        }
    }
}

/// Convenience type alias for dermlens results.
pub type Result<T> = std::result::Result<T, DermError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
