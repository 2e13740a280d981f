//! Turns a probability distribution into ranked findings.

use crate::config::ScoringConfig;
use crate::types::{ConditionProbabilities, DetectedCondition};

use super::enrichment::enrich;

/// Filters, enriches, ranks and truncates condition probabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionClassifier {
    /// Labels must score strictly above this to be reported.
    min_confidence: f64,
    max_conditions: usize,
}

impl ConditionClassifier {
    pub fn new(min_confidence: f64, max_conditions: usize) -> Self {
        Self {
            min_confidence,
            max_conditions,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.min_confidence, config.max_conditions)
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    pub fn max_conditions(&self) -> usize {
        self.max_conditions
    }

    /// Findings above the threshold, highest confidence first.
    ///
    /// The sort is stable, so equal probabilities keep label table order.
    pub fn classify(&self, probabilities: &ConditionProbabilities) -> Vec<DetectedCondition> {
        let mut conditions: Vec<DetectedCondition> = probabilities
            .iter()
            .filter(|(_, p)| *p > self.min_confidence)
            .map(|(label, p)| enrich(label, p))
            .collect();

        conditions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        conditions.truncate(self.max_conditions);
        conditions
    }
}

impl Default for ConditionClassifier {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}
