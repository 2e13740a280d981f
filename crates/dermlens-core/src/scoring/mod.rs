//! Zero-shot condition scoring.
//!
//! Each condition label has an engineered prompt. The prompts are encoded
//! once into a [`ConditionBank`]; every image embedding is then compared
//! against all rows and turned into a probability distribution by
//! [`ConditionScorer`].

pub mod bank;
pub mod prompts;
pub mod scorer;
pub mod text_encoder;

use std::path::Path;

use crate::config::{Config, EmbeddingConfig, EncoderBackend};
use crate::embedding::ProjectionTextEncoder;
use crate::error::PipelineError;

pub use bank::ConditionBank;
pub use prompts::{ConditionPrompt, CONDITION_PROMPTS};
pub use scorer::ConditionScorer;
pub use text_encoder::{OnnxTextEncoder, TextEncoder};

/// Filename of the cached condition bank inside the cache directory.
const BANK_CACHE_FILENAME: &str = "condition_bank.bin";

/// Load the text encoder matching the configured backend.
pub fn load_text_encoder(
    config: &EmbeddingConfig,
    model_dir: &Path,
) -> Result<Box<dyn TextEncoder>, PipelineError> {
    match config.backend {
        EncoderBackend::Projection => Ok(Box::new(ProjectionTextEncoder::new(
            config.embedding_dim,
        ))),
        EncoderBackend::Onnx => {
            let encoder_dir = model_dir.join(&config.model);
            tracing::info!("Loading text encoder from {:?}", encoder_dir);
            Ok(Box::new(OnnxTextEncoder::new(
                &encoder_dir,
                config.embedding_dim,
                config.context_length,
            )?))
        }
    }
}

/// Build the condition bank for a configuration.
///
/// ONNX banks are cached under the cache directory when enabled; the
/// projection bank is cheap and always encoded in memory.
pub fn build_condition_bank(
    encoder: &dyn TextEncoder,
    config: &Config,
) -> Result<ConditionBank, PipelineError> {
    let cacheable =
        config.embedding.backend == EncoderBackend::Onnx && config.scoring.cache_condition_bank;
    if !cacheable {
        return ConditionBank::encode_all(encoder);
    }

    let hash = prompts::table_hash(
        &format!("{}:{}", encoder.name(), config.embedding.model),
        encoder.embedding_dim(),
    );
    let path = config.cache_dir().join(BANK_CACHE_FILENAME);
    ConditionBank::load_or_encode(encoder, &path, &hash)
}
