//! Deterministic stand-in encoders.
//!
//! These produce stable, unit-length vectors without any model files, so
//! the whole pipeline can run (and be tested) on a machine that has never
//! downloaded a vision-language model. Scores they produce carry no
//! clinical meaning.
//!
//! - Image side: a fixed set of pixel statistics pushed through a seeded
//!   random projection.
//! - Text side: a PRNG seeded from the BLAKE3 hash of each prompt, with
//!   fixed boosts on shared dimension bands for related prompts.

use std::ops::Range;
use std::path::Path;

use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PipelineError;
use crate::scoring::TextEncoder;

use super::ImageEncoder;

/// Seed for the image projection matrix.
const PROJECTION_SEED: u64 = 42;

/// Side of the coarse luminance grid used as spatial features.
const GRID: usize = 4;

/// Channel means, channel stds, gray mean, gray std, luminance grid, bias.
const FEATURE_COUNT: usize = 3 + 3 + 2 + GRID * GRID + 1;

/// Prompts mentioning one of the keywords share a boosted dimension band.
const KEYWORD_BOOSTS: &[(&[&str], Range<usize>, f32)] = &[
    (&["melanoma", "carcinoma"], 0..50, 1.2),
    (&["healthy"], 50..100, 0.9),
    (&["acne", "eczema"], 100..150, 0.6),
];

/// Image encoder backed by a seeded random projection of pixel statistics.
pub struct ProjectionImageEncoder {
    /// Row-major `embedding_dim × FEATURE_COUNT` matrix.
    projection: Vec<f32>,
    embedding_dim: usize,
}

impl ProjectionImageEncoder {
    pub fn new(embedding_dim: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(PROJECTION_SEED);
        let projection = (0..embedding_dim * FEATURE_COUNT)
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect();
        Self {
            projection,
            embedding_dim,
        }
    }

    /// Summary statistics of an `[H, W, 3]` tensor, centered around zero.
    fn statistics(tensor: &Array3<f32>) -> [f32; FEATURE_COUNT] {
        let (height, width, _) = tensor.dim();
        let n = (height * width).max(1) as f32;

        let mut sum = [0.0f32; 3];
        let mut sum_sq = [0.0f32; 3];
        let mut gray_sum = 0.0f32;
        let mut gray_sum_sq = 0.0f32;
        let mut grid = [0.0f32; GRID * GRID];
        let mut grid_counts = [0usize; GRID * GRID];

        for y in 0..height {
            for x in 0..width {
                let px = [tensor[[y, x, 0]], tensor[[y, x, 1]], tensor[[y, x, 2]]];
                for c in 0..3 {
                    sum[c] += px[c];
                    sum_sq[c] += px[c] * px[c];
                }
                let gray = 0.299 * px[0] + 0.587 * px[1] + 0.114 * px[2];
                gray_sum += gray;
                gray_sum_sq += gray * gray;

                let cell = (y * GRID / height) * GRID + (x * GRID / width);
                grid[cell] += gray;
                grid_counts[cell] += 1;
            }
        }

        let mut features = [0.0f32; FEATURE_COUNT];
        for c in 0..3 {
            let mean = sum[c] / n;
            features[c] = mean - 0.5;
            features[3 + c] = (sum_sq[c] / n - mean * mean).max(0.0).sqrt();
        }
        let gray_mean = gray_sum / n;
        features[6] = gray_mean - 0.5;
        features[7] = (gray_sum_sq / n - gray_mean * gray_mean).max(0.0).sqrt();
        for (i, (&total, &count)) in grid.iter().zip(&grid_counts).enumerate() {
            features[8 + i] = if count > 0 {
                total / count as f32 - 0.5
            } else {
                0.0
            };
        }
        features[FEATURE_COUNT - 1] = 1.0;
        features
    }
}

impl ImageEncoder for ProjectionImageEncoder {
    fn name(&self) -> &str {
        "projection"
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    fn encode(&self, tensor: &Array3<f32>, _path: &Path) -> Result<Vec<f32>, PipelineError> {
        let features = Self::statistics(tensor);
        let mut embedding: Vec<f32> = self
            .projection
            .chunks_exact(FEATURE_COUNT)
            .map(|row| crate::math::dot(row, &features))
            .collect();
        crate::math::l2_normalize_in_place(&mut embedding);
        Ok(embedding)
    }
}

/// Text encoder that derives each prompt's vector from its BLAKE3 hash.
pub struct ProjectionTextEncoder {
    embedding_dim: usize,
}

impl ProjectionTextEncoder {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    fn encode_one(&self, text: &str) -> Vec<f32> {
        let mut rng = StdRng::from_seed(*blake3::hash(text.as_bytes()).as_bytes());
        let mut embedding: Vec<f32> = (0..self.embedding_dim)
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect();

        let lowered = text.to_lowercase();
        for (keywords, band, boost) in KEYWORD_BOOSTS {
            if keywords.iter().any(|k| lowered.contains(k)) {
                let end = band.end.min(self.embedding_dim);
                for v in &mut embedding[band.start.min(end)..end] {
                    *v += boost;
                }
            }
        }

        crate::math::l2_normalize_in_place(&mut embedding);
        embedding
    }
}

impl TextEncoder for ProjectionTextEncoder {
    fn name(&self) -> &str {
        "projection"
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        Ok(texts.iter().map(|t| self.encode_one(t)).collect())
    }
}
