//! Condition classification: thresholding, clinical enrichment and ranking.

pub mod classifier;
pub mod enrichment;

pub use classifier::ConditionClassifier;
pub use enrichment::{enrich, AttentionRule, ConditionInfo, SeverityRule, CONDITION_INFO};
