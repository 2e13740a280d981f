//! Pre-computed condition embeddings.
//!
//! The condition bank stores a flat N×D matrix of prompt embeddings, one row
//! per label in table order, built once at startup and read-only afterwards.

use std::path::Path;

use crate::error::PipelineError;

use super::prompts::CONDITION_PROMPTS;
use super::text_encoder::TextEncoder;

/// Immutable label → unit-vector table.
#[derive(Debug, Clone)]
pub struct ConditionBank {
    labels: Vec<String>,
    /// Flat matrix: N × D stored row-major.
    matrix: Vec<f32>,
    embedding_dim: usize,
}

impl ConditionBank {
    /// Build a bank from per-label embeddings.
    pub fn from_embeddings(
        labels: Vec<String>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, PipelineError> {
        if labels.len() != embeddings.len() {
            return Err(PipelineError::Model {
                message: format!(
                    "Condition bank has {} labels but {} embeddings",
                    labels.len(),
                    embeddings.len()
                ),
            });
        }

        let embedding_dim = embeddings.first().map(Vec::len).unwrap_or(0);
        let mut matrix = Vec::with_capacity(labels.len() * embedding_dim);
        for (label, emb) in labels.iter().zip(&embeddings) {
            if emb.len() != embedding_dim {
                return Err(PipelineError::Model {
                    message: format!(
                        "Embedding for '{}' has {} dimensions, expected {}",
                        label,
                        emb.len(),
                        embedding_dim
                    ),
                });
            }
            matrix.extend_from_slice(emb);
        }

        Ok(Self {
            labels,
            matrix,
            embedding_dim,
        })
    }

    /// Encode every condition prompt.
    pub fn encode_all(encoder: &dyn TextEncoder) -> Result<Self, PipelineError> {
        let labels: Vec<String> = CONDITION_PROMPTS
            .iter()
            .map(|p| p.label.to_string())
            .collect();
        let prompts = super::prompts::prompts();

        tracing::debug!(
            "Encoding {} condition prompts with {} text encoder",
            prompts.len(),
            encoder.name()
        );
        let embeddings = encoder.encode_batch(&prompts)?;
        let bank = Self::from_embeddings(labels, embeddings)?;

        if bank.embedding_dim != encoder.embedding_dim() {
            return Err(PipelineError::Model {
                message: format!(
                    "Text encoder produced {} dimensions, expected {}",
                    bank.embedding_dim,
                    encoder.embedding_dim()
                ),
            });
        }
        Ok(bank)
    }

    /// Load a cached bank when its hash matches, otherwise encode and cache.
    ///
    /// Cache write failures are logged and otherwise ignored.
    pub fn load_or_encode(
        encoder: &dyn TextEncoder,
        cache_path: &Path,
        table_hash: &str,
    ) -> Result<Self, PipelineError> {
        if Self::cache_valid(cache_path, table_hash) {
            match Self::load(cache_path, encoder.embedding_dim()) {
                Ok(bank) => return Ok(bank),
                Err(e) => tracing::warn!("Ignoring unreadable condition bank cache: {e}"),
            }
        }

        let bank = Self::encode_all(encoder)?;
        if let Some(parent) = cache_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Could not create cache directory {:?}: {e}", parent);
                return Ok(bank);
            }
        }
        if let Err(e) = bank.save(cache_path, table_hash) {
            tracing::warn!("{e}");
        }
        Ok(bank)
    }

    /// Save the bank to disk as raw little-endian f32.
    ///
    /// Also writes a `.meta` sidecar with the table hash for cache invalidation.
    pub fn save(&self, path: &Path, table_hash: &str) -> Result<(), PipelineError> {
        let bytes: Vec<u8> = self.matrix.iter().flat_map(|f| f.to_le_bytes()).collect();
        std::fs::write(path, &bytes).map_err(|e| PipelineError::Model {
            message: format!("Failed to save condition bank to {:?}: {}", path, e),
        })?;

        let meta_path = path.with_extension("meta");
        let meta = format!(
            "table_hash={}\nlabel_count={}\nembedding_dim={}\n",
            table_hash,
            self.labels.len(),
            self.embedding_dim
        );
        std::fs::write(&meta_path, meta).map_err(|e| PipelineError::Model {
            message: format!(
                "Failed to save condition bank metadata to {:?}: {}",
                meta_path, e
            ),
        })?;

        tracing::debug!("Saved condition bank to {:?}", path);
        Ok(())
    }

    /// Load a bank for the current label table from a raw f32 file.
    pub fn load(path: &Path, embedding_dim: usize) -> Result<Self, PipelineError> {
        let labels: Vec<String> = CONDITION_PROMPTS
            .iter()
            .map(|p| p.label.to_string())
            .collect();
        let expected_len = labels.len() * embedding_dim * 4;

        let bytes = std::fs::read(path).map_err(|e| PipelineError::Model {
            message: format!("Failed to read condition bank from {:?}: {}", path, e),
        })?;

        if bytes.len() != expected_len {
            return Err(PipelineError::Model {
                message: format!(
                    "Condition bank size mismatch: expected {} bytes, got {} bytes",
                    expected_len,
                    bytes.len()
                ),
            });
        }

        let matrix: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        tracing::info!(
            "Loaded condition bank: {} labels from {:?}",
            labels.len(),
            path
        );

        Ok(Self {
            labels,
            matrix,
            embedding_dim,
        })
    }

    /// Check if a cached bank's table hash matches.
    pub fn cache_valid(path: &Path, table_hash: &str) -> bool {
        if !path.exists() {
            return false;
        }
        let Ok(content) = std::fs::read_to_string(path.with_extension("meta")) else {
            return false;
        };
        content
            .lines()
            .any(|line| line == format!("table_hash={}", table_hash))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Get the flat matrix for batch dot product.
    pub fn matrix(&self) -> &[f32] {
        &self.matrix
    }

    /// Row `i` of the matrix.
    pub fn embedding(&self, i: usize) -> Option<&[f32]> {
        let start = i.checked_mul(self.embedding_dim)?;
        self.matrix.get(start..start + self.embedding_dim)
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
