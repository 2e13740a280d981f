//! Text encoders for condition prompts.
//!
//! The ONNX encoder loads a CLIP-style text tower and its tokenizer and maps
//! prompts into the same space as the image encoder.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

/// Text tower ONNX filename.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";

/// Tokenizer definition filename.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Output tensors tried in order; the first output is used if none match.
const PREFERRED_OUTPUTS: &[&str] = &["text_embeds", "pooler_output", "sentence_embedding"];

/// Maps prompts to L2-normalized embeddings.
pub trait TextEncoder: Send + Sync {
    /// Short backend name for logs and cache keys.
    fn name(&self) -> &str;

    /// Length of every vector this encoder returns.
    fn embedding_dim(&self) -> usize;

    /// Encode a batch of texts, one unit vector per input in input order.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;

    /// Encode a single text.
    fn encode(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        self.encode_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Model {
                message: "Text encoder returned empty result for single input".to_string(),
            })
    }
}

/// ONNX text encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the image encoder.
pub struct OnnxTextEncoder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    embedding_dim: usize,
    context_length: usize,
    /// Whether the exported graph declares an `attention_mask` input.
    wants_attention_mask: bool,
}

impl OnnxTextEncoder {
    /// Load the text encoder from an encoder directory.
    ///
    /// Expects `text_model.onnx` and `tokenizer.json` in `encoder_dir`.
    pub fn new(
        encoder_dir: &Path,
        embedding_dim: usize,
        context_length: usize,
    ) -> Result<Self, PipelineError> {
        let text_model_path = encoder_dir.join(TEXT_MODEL_FILENAME);
        let tokenizer_path = encoder_dir.join(TOKENIZER_FILENAME);

        if !text_model_path.exists() {
            return Err(PipelineError::Model {
                message: format!("Text encoder not found at {:?}", text_model_path),
            });
        }

        if !tokenizer_path.exists() {
            return Err(PipelineError::Model {
                message: format!("Tokenizer not found at {:?}", tokenizer_path),
            });
        }

        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(&text_model_path)
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load text encoder model: {e}"),
            })?;

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            PipelineError::Model {
                message: format!("Failed to load tokenizer: {e}"),
            }
        })?;

        let wants_attention_mask = session
            .inputs()
            .iter()
            .any(|i| i.name() == "attention_mask");

        tracing::debug!(
            "Loaded text encoder (inputs: {:?}, outputs: {:?})",
            session
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>(),
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            embedding_dim,
            context_length,
            wants_attention_mask,
        })
    }

    /// Check whether the text encoder model files exist.
    pub fn model_exists(encoder_dir: &Path) -> bool {
        encoder_dir.join(TEXT_MODEL_FILENAME).exists()
            && encoder_dir.join(TOKENIZER_FILENAME).exists()
    }
}

impl TextEncoder for OnnxTextEncoder {
    fn name(&self) -> &str {
        "onnx"
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let max_length = self.context_length;
        let batch_size = texts.len();
        if batch_size == 0 {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| PipelineError::Model {
                message: format!("Tokenization failed: {e}"),
            })?;

        // Zero-padded ids with a matching mask; over-long prompts are truncated
        let mut input_ids = vec![0i64; batch_size * max_length];
        let mut attention_mask = vec![0i64; batch_size * max_length];

        for (i, encoding) in encodings.iter().enumerate() {
            for (j, &id) in encoding.get_ids().iter().take(max_length).enumerate() {
                input_ids[i * max_length + j] = id as i64;
                attention_mask[i * max_length + j] = 1;
            }
        }

        let shape = vec![batch_size as i64, max_length as i64];
        let input_ids_value =
            Value::from_array((shape.clone(), input_ids)).map_err(|e| PipelineError::Model {
                message: format!("Failed to create input tensor: {e}"),
            })?;

        let mut session = self.session.lock().map_err(|e| PipelineError::Model {
            message: format!("Text encoder lock poisoned: {e}"),
        })?;

        let run_result = if self.wants_attention_mask {
            let mask_value =
                Value::from_array((shape, attention_mask)).map_err(|e| PipelineError::Model {
                    message: format!("Failed to create attention mask tensor: {e}"),
                })?;
            session.run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => mask_value
            ])
        } else {
            session.run(ort::inputs!["input_ids" => input_ids_value])
        };

        let outputs = run_result.map_err(|e| PipelineError::Model {
            message: format!("Text encoder inference failed: {e}"),
        })?;

        let output = outputs
            .iter()
            .find(|(name, _)| PREFERRED_OUTPUTS.contains(name))
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| PipelineError::Model {
                message: "Text encoder produced no outputs".to_string(),
            })?;

        let (shape, data) =
            output
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Model {
                    message: format!("Failed to extract text embeddings: {e}"),
                })?;

        if shape.len() != 2 || shape[0] as usize != batch_size {
            return Err(PipelineError::Model {
                message: format!(
                    "Unexpected text embedding shape {:?} for batch of {}",
                    shape, batch_size
                ),
            });
        }

        let dim = shape[1] as usize;
        if dim != self.embedding_dim {
            return Err(PipelineError::Model {
                message: format!(
                    "Text embeddings have {} dimensions, expected {}",
                    dim, self.embedding_dim
                ),
            });
        }

        // Split flat output into per-text embeddings and L2-normalize
        Ok(data.chunks(dim).map(crate::math::l2_normalize).collect())
    }
}
