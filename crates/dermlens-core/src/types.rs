//! Core data types produced by the analysis pipeline.
//!
//! These types are the serialized output of analyzing one photograph.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Properties of a decoded input image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Number of color channels in the decoded image
    pub channels: u8,

    /// Detected format ("jpeg", "png", "webp", etc.)
    pub format: String,

    /// File size in bytes
    pub size_bytes: u64,

    /// Whether the image carries an alpha channel
    pub has_alpha: bool,
}

/// Either image metadata or the error that ended an analysis early.
///
/// Callers distinguish "nothing above threshold" from "analysis failed" by
/// checking for the `Error` variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataPayload {
    Image(ImageMetadata),
    Error { error: String },
}

impl MetadataPayload {
    pub fn error(&self) -> Option<&str> {
        match self {
            MetadataPayload::Error { error } => Some(error),
            MetadataPayload::Image(_) => None,
        }
    }
}

/// Clinical severity attached to a detected condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Mild,
    Moderate,
    Severe,
    Unknown,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::None => "none",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One ranked finding in an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedCondition {
    /// Raw condition label the probability was computed for
    pub label: String,

    /// Human-readable condition name
    pub condition_name: String,

    /// Probability from the softmax, 0.0 to 1.0
    pub confidence: f64,

    pub severity: Severity,

    /// Category tag ("dermatological", "oncological", "benign", ...)
    pub category: String,

    pub description: String,

    /// Whether the finding warrants clinical attention
    pub requires_attention: bool,
}

/// The complete result of analyzing one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinAnalysis {
    /// Unique per analysis call
    pub analysis_id: Uuid,

    /// Findings ranked by confidence, highest first
    pub conditions: Vec<DetectedCondition>,

    /// condition_name → confidence for every entry in `conditions`
    pub confidence_scores: BTreeMap<String, f64>,

    /// Elapsed wall time in seconds
    pub processing_time: f64,

    pub image_metadata: MetadataPayload,

    pub timestamp: DateTime<Utc>,
}

impl SkinAnalysis {
    /// Build a completed analysis; `confidence_scores` is derived from `conditions`.
    pub fn completed(
        analysis_id: Uuid,
        conditions: Vec<DetectedCondition>,
        processing_time: f64,
        metadata: ImageMetadata,
    ) -> Self {
        let confidence_scores = conditions
            .iter()
            .map(|c| (c.condition_name.clone(), c.confidence))
            .collect();
        Self {
            analysis_id,
            conditions,
            confidence_scores,
            processing_time,
            image_metadata: MetadataPayload::Image(metadata),
            timestamp: Utc::now(),
        }
    }

    /// Build the soft-failure result: no conditions, error text in metadata.
    pub fn failed(analysis_id: Uuid, processing_time: f64, error: impl Into<String>) -> Self {
        Self {
            analysis_id,
            conditions: vec![],
            confidence_scores: BTreeMap::new(),
            processing_time,
            image_metadata: MetadataPayload::Error {
                error: error.into(),
            },
            timestamp: Utc::now(),
        }
    }

    /// Whether the analysis ended in an internal error.
    pub fn is_error(&self) -> bool {
        self.image_metadata.error().is_some()
    }
}

/// Raw cosine similarity per condition label, in label table order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimilarityScores {
    entries: Vec<(String, f32)>,
}

impl SimilarityScores {
    pub fn new(entries: Vec<(String, f32)>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(l, s)| (l.as_str(), *s))
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, s)| *s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Probability per condition label, in label table order. Sums to 1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionProbabilities {
    entries: Vec<(String, f64)>,
}

impl ConditionProbabilities {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, p)| (l.as_str(), *p))
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }
}

fn serialize_ordered<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (label, value) in entries {
        map.serialize_entry(label, value)?;
    }
    map.end()
}

impl Serialize for SimilarityScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_ordered(&self.entries, serializer)
    }
}

impl Serialize for ConditionProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_ordered(&self.entries, serializer)
    }
}
