//! Cosine similarity and temperature-scaled softmax over the condition bank.

use ndarray::{ArrayView1, ArrayView2};

use crate::error::PipelineError;
use crate::math;
use crate::types::{ConditionProbabilities, SimilarityScores};

use super::bank::ConditionBank;

/// Scores image embeddings against a fixed condition bank.
///
/// Owns the bank; constructed once and shared read-only afterwards.
pub struct ConditionScorer {
    bank: ConditionBank,
    temperature: f64,
}

impl ConditionScorer {
    pub fn new(bank: ConditionBank, temperature: f64) -> Self {
        Self { bank, temperature }
    }

    pub fn bank(&self) -> &ConditionBank {
        &self.bank
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Dot product of the image embedding with every condition row.
    ///
    /// Both sides are unit-norm, so each value is a cosine similarity.
    /// Computed as one matrix-vector product (BLAS-backed on macOS).
    pub fn similarities(&self, image_embedding: &[f32]) -> Result<SimilarityScores, PipelineError> {
        let dim = self.bank.embedding_dim();
        if image_embedding.len() != dim {
            return Err(PipelineError::Scoring {
                message: format!(
                    "Image embedding has {} dimensions, condition bank has {}",
                    image_embedding.len(),
                    dim
                ),
            });
        }

        let matrix = ArrayView2::from_shape((self.bank.len(), dim), self.bank.matrix())
            .map_err(|e| PipelineError::Scoring {
                message: format!("Condition bank matrix is malformed: {e}"),
            })?;
        let scores = matrix.dot(&ArrayView1::from(image_embedding));

        let entries = self
            .bank
            .labels()
            .iter()
            .cloned()
            .zip(scores.iter().copied())
            .collect();
        Ok(SimilarityScores::new(entries))
    }

    /// Softmax over all similarities jointly at the configured temperature.
    pub fn probabilities(&self, similarities: &SimilarityScores) -> ConditionProbabilities {
        let logits: Vec<f64> = similarities.iter().map(|(_, s)| s as f64).collect();
        let probs = math::softmax_with_temperature(&logits, self.temperature);
        ConditionProbabilities::new(
            similarities
                .iter()
                .zip(probs)
                .map(|((label, _), p)| (label.to_string(), p))
                .collect(),
        )
    }

    /// Similarities followed by softmax.
    pub fn score(&self, image_embedding: &[f32]) -> Result<ConditionProbabilities, PipelineError> {
        let similarities = self.similarities(image_embedding)?;
        tracing::trace!("Similarities: {:?}", similarities);
        Ok(self.probabilities(&similarities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SOFTMAX_TEMPERATURE;
    use crate::embedding::ProjectionTextEncoder;
    use crate::scoring::TextEncoder;

    fn toy_scorer() -> ConditionScorer {
        let bank = ConditionBank::from_embeddings(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]],
        )
        .unwrap();
        ConditionScorer::new(bank, SOFTMAX_TEMPERATURE)
    }

    #[test]
    fn test_similarities_are_dot_products() {
        let sims = toy_scorer().similarities(&[0.6, 0.8]).unwrap();
        assert!((sims.get("a").unwrap() - 0.6).abs() < 1e-6);
        assert!((sims.get("b").unwrap() - 0.8).abs() < 1e-6);
        assert!((sims.get("c").unwrap() + 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_probabilities_sum_to_one_and_rank_by_similarity() {
        let probs = toy_scorer().score(&[0.6, 0.8]).unwrap();
        assert!((probs.total() - 1.0).abs() < 1e-6);
        assert!(probs.iter().all(|(_, p)| p >= 0.0));
        assert!(probs.get("b").unwrap() > probs.get("a").unwrap());
        assert!(probs.get("a").unwrap() > probs.get("c").unwrap());
    }

    #[test]
    fn test_temperature_sharpens() {
        let bank = toy_scorer().bank().clone();
        let sharp = ConditionScorer::new(bank.clone(), 0.07).score(&[0.6, 0.8]).unwrap();
        let soft = ConditionScorer::new(bank, 1.0).score(&[0.6, 0.8]).unwrap();
        assert!(sharp.get("b").unwrap() > soft.get("b").unwrap());
    }

    #[test]
    fn test_dimension_mismatch_is_scoring_error() {
        let result = toy_scorer().similarities(&[1.0, 0.0, 0.0]);
        assert!(matches!(result, Err(PipelineError::Scoring { .. })));
    }

    #[test]
    fn test_distribution_over_real_bank() {
        let encoder = ProjectionTextEncoder::new(512);
        let bank = ConditionBank::encode_all(&encoder).unwrap();
        let scorer = ConditionScorer::new(bank, SOFTMAX_TEMPERATURE);

        for prompt in ["random image", "another", "third probe"] {
            let emb = encoder.encode(prompt).unwrap();
            let probs = scorer.score(&emb).unwrap();
            assert_eq!(probs.len(), 10);
            assert!((probs.total() - 1.0).abs() < 1e-6);
            assert!(probs.iter().all(|(_, p)| (0.0..=1.0).contains(&p)));
        }
    }
}
