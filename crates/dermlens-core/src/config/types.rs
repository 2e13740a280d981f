//! Configuration section types and their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum accepted image file size in bytes (10 MiB).
pub const MAX_IMAGE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions accepted by validation.
pub const SUPPORTED_FORMATS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp"];

/// Side length of the square tensor fed to the image encoder.
pub const TARGET_RESOLUTION: u32 = 224;

/// Softmax temperature applied to cosine similarities.
pub const SOFTMAX_TEMPERATURE: f64 = 0.07;

/// A condition is reported only when its probability is strictly above this.
pub const CONFIDENCE_THRESHOLD: f64 = 0.10;

/// Maximum number of conditions in one analysis.
pub const MAX_CONDITIONS: usize = 5;

/// Embedding dimensionality of the default encoder pair.
pub const DEFAULT_EMBEDDING_DIM: usize = 512;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where encoder models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.dermlens/models"),
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of analyses allowed in flight at once
    pub parallel_workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
        }
    }
}

/// Input limits enforced by validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in bytes
    pub max_file_size_bytes: u64,

    /// Accepted file extensions (lowercase, no dot)
    pub supported_formats: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: MAX_IMAGE_SIZE_BYTES,
            supported_formats: SUPPORTED_FORMATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LimitsConfig {
    /// Whether `extension` (with or without a leading dot) is on the allow-list.
    pub fn is_supported_extension(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_lowercase();
        self.supported_formats
            .iter()
            .any(|fmt| fmt.to_lowercase() == ext)
    }
}

/// Which encoder pair produces embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderBackend {
    /// Deterministic feature-projection stand-in, needs no model files
    #[default]
    Projection,
    /// Vision-language encoders exported to ONNX
    Onnx,
}

impl std::fmt::Display for EncoderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncoderBackend::Projection => write!(f, "projection"),
            EncoderBackend::Onnx => write!(f, "onnx"),
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Encoder backend
    pub backend: EncoderBackend,

    /// Model directory name under `general.model_dir` (ONNX backend only)
    pub model: String,

    /// Square input size of the preprocessed tensor
    pub image_size: u32,

    /// Output dimensionality shared by image and text embeddings
    pub embedding_dim: usize,

    /// Token sequence length for the text encoder (ONNX backend only)
    pub context_length: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EncoderBackend::Projection,
            model: "biomedclip".to_string(),
            image_size: TARGET_RESOLUTION,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            context_length: 256,
        }
    }
}

/// Similarity scoring and postprocessing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Softmax temperature
    pub temperature: f64,

    /// Strict lower bound on probability for a reported condition
    pub min_confidence: f64,

    /// Maximum conditions per analysis
    pub max_conditions: usize,

    /// Persist encoded prompt embeddings between runs (ONNX backend only)
    pub cache_condition_bank: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            temperature: SOFTMAX_TEMPERATURE,
            min_confidence: CONFIDENCE_THRESHOLD,
            max_conditions: MAX_CONDITIONS,
            cache_condition_bank: true,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("error", "warn", "info", "debug", "trace")
    pub level: String,

    /// Log format ("pretty" or "json")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
