//! Image embedding generation.
//!
//! Turns a preprocessed image into a unit-length vector in the joint
//! image-text space. The encoder sits behind the [`ImageEncoder`] trait so
//! the pipeline can run either a real vision tower through ONNX Runtime or
//! the deterministic projection stand-in that needs no model files.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dermlens_core::embedding::EmbeddingEngine;
//! use dermlens_core::config::Config;
//!
//! let config = Config::default();
//! let engine = EmbeddingEngine::load(&config.embedding, &config.model_dir())?;
//! let embedding = engine.embed(&decoded_image, path)?;
//! // embedding is a unit-norm Vec<f32> with 512 elements
//! ```

pub(crate) mod onnx;
pub(crate) mod preprocess;
pub mod projection;

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ndarray::Array3;

use crate::config::{EmbeddingConfig, EncoderBackend};
use crate::error::PipelineError;

pub use self::onnx::OnnxImageEncoder;
pub use self::preprocess::preprocess;
pub use self::projection::{ProjectionImageEncoder, ProjectionTextEncoder};

/// The visual encoder ONNX model filename.
pub const VISUAL_MODEL_FILENAME: &str = "visual.onnx";

/// Maps a preprocessed `[H, W, 3]` tensor to an L2-normalized embedding.
pub trait ImageEncoder: Send + Sync {
    /// Short backend name for logs and model info.
    fn name(&self) -> &str;

    /// Length of every vector this encoder returns.
    fn embedding_dim(&self) -> usize;

    /// Encode one preprocessed image. `path` is only used for error context.
    fn encode(&self, tensor: &Array3<f32>, path: &Path) -> Result<Vec<f32>, PipelineError>;
}

/// Engine for generating image embeddings.
pub struct EmbeddingEngine {
    encoder: Box<dyn ImageEncoder>,
    image_size: u32,
}

impl EmbeddingEngine {
    /// Load the configured image encoder.
    ///
    /// The ONNX backend expects its model at `{model_dir}/{model}/visual.onnx`.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, PipelineError> {
        let encoder: Box<dyn ImageEncoder> = match config.backend {
            EncoderBackend::Projection => {
                tracing::debug!(
                    "Using projection image encoder ({} dims)",
                    config.embedding_dim
                );
                Box::new(ProjectionImageEncoder::new(config.embedding_dim))
            }
            EncoderBackend::Onnx => {
                let model_path = Self::model_path(config, model_dir);
                if !model_path.exists() {
                    return Err(PipelineError::Model {
                        message: format!(
                            "Image encoder not found at {:?}. Place the exported model there \
                             or switch `embedding.backend` to \"projection\".",
                            model_path
                        ),
                    });
                }

                tracing::info!("Loading image encoder from {:?}", model_path);
                let encoder = OnnxImageEncoder::load(&model_path, config.embedding_dim)?;
                tracing::info!("Image encoder loaded successfully");
                Box::new(encoder)
            }
        };

        Ok(Self::from_encoder(encoder, config.image_size))
    }

    /// Wrap an already-constructed encoder.
    pub fn from_encoder(encoder: Box<dyn ImageEncoder>, image_size: u32) -> Self {
        Self {
            encoder,
            image_size,
        }
    }

    /// Side length of the square encoder input.
    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    pub fn embedding_dim(&self) -> usize {
        self.encoder.embedding_dim()
    }

    pub fn backend_name(&self) -> &str {
        self.encoder.name()
    }

    /// Resize and scale an image into the encoder's input tensor.
    pub fn preprocess(&self, image: &DynamicImage) -> Array3<f32> {
        preprocess(image, self.image_size)
    }

    /// Generate an embedding vector for an image.
    pub fn embed(&self, image: &DynamicImage, path: &Path) -> Result<Vec<f32>, PipelineError> {
        let tensor = self.preprocess(image);
        self.embed_preprocessed(&tensor, path)
    }

    /// Generate an embedding from an already-preprocessed tensor.
    pub fn embed_preprocessed(
        &self,
        tensor: &Array3<f32>,
        path: &Path,
    ) -> Result<Vec<f32>, PipelineError> {
        let expected = self.image_size as usize;
        if tensor.dim() != (expected, expected, preprocess::CHANNELS) {
            return Err(PipelineError::Embedding {
                path: path.to_path_buf(),
                message: format!(
                    "Expected a {expected}x{expected}x3 tensor, got {:?}",
                    tensor.shape()
                ),
            });
        }
        self.encoder.encode(tensor, path)
    }

    /// Check whether the ONNX model file exists on disk.
    pub fn model_exists(config: &EmbeddingConfig, model_dir: &Path) -> bool {
        Self::model_path(config, model_dir).exists()
    }

    /// Get the expected ONNX model file path.
    pub fn model_path(config: &EmbeddingConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model).join(VISUAL_MODEL_FILENAME)
    }
}
