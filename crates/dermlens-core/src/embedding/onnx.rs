//! ONNX Runtime session for a CLIP-style visual encoder.
//!
//! Loads a vision tower exported to ONNX (e.g. BiomedCLIP) and runs
//! inference to produce L2-normalized image embeddings.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array3;
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

use super::preprocess::CHANNELS;
use super::ImageEncoder;

/// CLIP normalization mean (per-channel, RGB).
const NORM_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization std (per-channel, RGB).
const NORM_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Output tensors tried in order; the first output is used if none match.
const PREFERRED_OUTPUTS: &[&str] = &["image_embeds", "pooler_output", "embeddings"];

/// Wraps an ONNX Runtime session for visual embedding.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct OnnxImageEncoder {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
    embedding_dim: usize,
}

impl OnnxImageEncoder {
    /// Load a visual encoder from an ONNX file.
    pub fn load(model_path: &Path, embedding_dim: usize) -> Result<Self, PipelineError> {
        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load ONNX model {:?}: {e}", model_path),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        tracing::debug!(
            "Loaded visual encoder from {:?} (input: {:?}, outputs: {:?})",
            model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            embedding_dim,
        })
    }

    /// Convert an HWC [0, 1] tensor into a flat NCHW buffer with CLIP normalization.
    fn to_nchw(tensor: &Array3<f32>) -> (Vec<i64>, Vec<f32>) {
        let (height, width, _) = tensor.dim();
        let mut flat = vec![0.0f32; CHANNELS * height * width];
        for ((y, x, c), &val) in tensor.indexed_iter() {
            flat[c * height * width + y * width + x] = (val - NORM_MEAN[c]) / NORM_STD[c];
        }
        let shape = vec![1, CHANNELS as i64, height as i64, width as i64];
        (shape, flat)
    }
}

impl ImageEncoder for OnnxImageEncoder {
    fn name(&self) -> &str {
        "onnx"
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    fn encode(&self, tensor: &Array3<f32>, path: &Path) -> Result<Vec<f32>, PipelineError> {
        let (shape, flat_data) = Self::to_nchw(tensor);

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| PipelineError::Embedding {
                path: path.to_path_buf(),
                message: format!("Failed to create input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| PipelineError::Embedding {
            path: path.to_path_buf(),
            message: format!("Session lock poisoned: {e}"),
        })?;

        let outputs = session.run(inputs).map_err(|e| PipelineError::Embedding {
            path: path.to_path_buf(),
            message: format!("ONNX inference failed: {e}"),
        })?;

        let output = outputs
            .iter()
            .find(|(name, _)| PREFERRED_OUTPUTS.contains(name))
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| PipelineError::Embedding {
                path: path.to_path_buf(),
                message: "Model produced no outputs".to_string(),
            })?;

        let (shape, data) =
            output
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Embedding {
                    path: path.to_path_buf(),
                    message: format!("Failed to extract embedding tensor: {e}"),
                })?;

        // Output is [1, D] or [D]
        let mut raw = match shape.len() {
            1 => data.to_vec(),
            2 => {
                let dim = shape[1] as usize;
                data[..dim].to_vec()
            }
            _ => {
                return Err(PipelineError::Embedding {
                    path: path.to_path_buf(),
                    message: format!("Unexpected embedding shape: {:?}", shape),
                });
            }
        };

        if raw.len() != self.embedding_dim {
            return Err(PipelineError::Embedding {
                path: path.to_path_buf(),
                message: format!(
                    "Embedding has {} dimensions, expected {}",
                    raw.len(),
                    self.embedding_dim
                ),
            });
        }

        crate::math::l2_normalize_in_place(&mut raw);
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nchw_layout_and_normalization() {
        let mut tensor = Array3::<f32>::zeros((2, 3, 3));
        tensor[[1, 2, 0]] = 1.0;
        let (shape, flat) = OnnxImageEncoder::to_nchw(&tensor);
        assert_eq!(shape, vec![1, 3, 2, 3]);
        assert_eq!(flat.len(), 18);

        // Red channel, y=1, x=2 -> offset 0*6 + 1*3 + 2
        let expected = (1.0 - NORM_MEAN[0]) / NORM_STD[0];
        assert!((flat[5] - expected).abs() < 1e-6);

        // Blue channel at origin holds the normalized zero
        let zero_blue = (0.0 - NORM_MEAN[2]) / NORM_STD[2];
        assert!((flat[12] - zero_blue).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_model_fails() {
        let result = OnnxImageEncoder::load(Path::new("/nonexistent/visual.onnx"), 512);
        assert!(matches!(result, Err(PipelineError::Model { .. })));
    }
}
