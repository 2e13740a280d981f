//! Clinical enrichment of condition labels.
//!
//! A static table maps a label to its display name, severity, category,
//! description and attention flag. Severity and attention may depend on the
//! label's own confidence. Labels missing from the table get a cautious
//! fallback that always requires attention.
//!
//! The table is keyed independently of the prompt table: several prompt
//! labels (e.g. `melanoma`, `healthy_skin`) have no entry here and take the
//! fallback.

use serde::Serialize;

use crate::types::{DetectedCondition, Severity};

/// How severity is derived from confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityRule {
    Fixed(Severity),
    /// `below` under `cutoff`, `at_or_above` from `cutoff` upward.
    Threshold {
        cutoff: f64,
        below: Severity,
        at_or_above: Severity,
    },
}

impl SeverityRule {
    pub fn apply(self, confidence: f64) -> Severity {
        match self {
            SeverityRule::Fixed(severity) => severity,
            SeverityRule::Threshold {
                cutoff,
                below,
                at_or_above,
            } => {
                if confidence < cutoff {
                    below
                } else {
                    at_or_above
                }
            }
        }
    }
}

/// How the attention flag is derived from confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionRule {
    Always,
    Never,
    /// Strictly above the given confidence.
    Above(f64),
}

impl AttentionRule {
    pub fn apply(self, confidence: f64) -> bool {
        match self {
            AttentionRule::Always => true,
            AttentionRule::Never => false,
            AttentionRule::Above(cutoff) => confidence > cutoff,
        }
    }
}

/// One row of the enrichment table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConditionInfo {
    pub label: &'static str,
    pub condition_name: &'static str,
    pub severity: SeverityRule,
    pub category: &'static str,
    pub description: &'static str,
    pub attention: AttentionRule,
}

const FALLBACK_DESCRIPTION: &str = "Detected condition requiring professional evaluation";
const FALLBACK_CATEGORY: &str = "unknown";

/// Known conditions.
pub const CONDITION_INFO: &[ConditionInfo] = &[
    ConditionInfo {
        label: "normal_skin",
        condition_name: "Normal Skin",
        severity: SeverityRule::Fixed(Severity::None),
        category: "normal",
        description: "No significant skin abnormalities detected",
        attention: AttentionRule::Never,
    },
    ConditionInfo {
        label: "acne",
        condition_name: "Acne",
        severity: SeverityRule::Threshold {
            cutoff: 0.7,
            below: Severity::Mild,
            at_or_above: Severity::Moderate,
        },
        category: "dermatological",
        description: "Common skin condition with pimples, blackheads, or whiteheads",
        attention: AttentionRule::Above(0.8),
    },
    ConditionInfo {
        label: "eczema",
        condition_name: "Eczema (Atopic Dermatitis)",
        severity: SeverityRule::Threshold {
            cutoff: 0.6,
            below: Severity::Mild,
            at_or_above: Severity::Moderate,
        },
        category: "dermatological",
        description: "Inflammatory skin condition causing itchy, red, swollen skin",
        attention: AttentionRule::Always,
    },
    ConditionInfo {
        label: "psoriasis",
        condition_name: "Psoriasis",
        severity: SeverityRule::Fixed(Severity::Moderate),
        category: "dermatological",
        description: "Autoimmune condition causing scaly, itchy patches",
        attention: AttentionRule::Always,
    },
    ConditionInfo {
        label: "melanoma_risk",
        condition_name: "Potential Melanoma Risk",
        severity: SeverityRule::Fixed(Severity::Severe),
        category: "oncological",
        description: "Suspicious pigmented lesion that may require immediate medical evaluation",
        attention: AttentionRule::Always,
    },
    ConditionInfo {
        label: "basal_cell_carcinoma_risk",
        condition_name: "Potential Basal Cell Carcinoma",
        severity: SeverityRule::Fixed(Severity::Moderate),
        category: "oncological",
        description: "Suspicious lesion that may be basal cell carcinoma",
        attention: AttentionRule::Always,
    },
    ConditionInfo {
        label: "seborrheic_keratosis",
        condition_name: "Seborrheic Keratosis",
        severity: SeverityRule::Fixed(Severity::Mild),
        category: "benign",
        description: "Common benign skin growth, usually harmless",
        attention: AttentionRule::Never,
    },
    ConditionInfo {
        label: "dermatofibroma",
        condition_name: "Dermatofibroma",
        severity: SeverityRule::Fixed(Severity::Mild),
        category: "benign",
        description: "Benign fibrous skin nodule",
        attention: AttentionRule::Never,
    },
    ConditionInfo {
        label: "nevus",
        condition_name: "Nevus (Mole)",
        severity: SeverityRule::Fixed(Severity::Mild),
        category: "benign",
        description: "Common pigmented skin lesion, usually benign",
        attention: AttentionRule::Above(0.8),
    },
    ConditionInfo {
        label: "vascular_lesion",
        condition_name: "Vascular Lesion",
        severity: SeverityRule::Fixed(Severity::Mild),
        category: "vascular",
        description: "Blood vessel-related skin lesion",
        attention: AttentionRule::Above(0.7),
    },
];

/// Look up a table row.
pub fn lookup(label: &str) -> Option<&'static ConditionInfo> {
    CONDITION_INFO.iter().find(|info| info.label == label)
}

/// Build the detected condition for a label at a given confidence.
///
/// Pure: the same `(label, confidence)` always gives the same result, and
/// `confidence` is carried through unchanged.
pub fn enrich(label: &str, confidence: f64) -> DetectedCondition {
    match lookup(label) {
        Some(info) => DetectedCondition {
            label: label.to_string(),
            condition_name: info.condition_name.to_string(),
            confidence,
            severity: info.severity.apply(confidence),
            category: info.category.to_string(),
            description: info.description.to_string(),
            requires_attention: info.attention.apply(confidence),
        },
        None => {
            tracing::trace!("No enrichment entry for '{label}', using fallback");
            DetectedCondition {
                label: label.to_string(),
                condition_name: display_name(label),
                confidence,
                severity: Severity::Unknown,
                category: FALLBACK_CATEGORY.to_string(),
                description: FALLBACK_DESCRIPTION.to_string(),
                requires_attention: true,
            }
        }
    }
}

/// Title-case a label, turning underscores into spaces.
///
/// Every letter following a non-letter is uppercased, all others lowercased.
pub fn display_name(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut word_start = true;
    for ch in label.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(ch);
            word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acne_severity_boundary() {
        assert_eq!(enrich("acne", 0.65).severity, Severity::Mild);
        assert_eq!(enrich("acne", 0.6999).severity, Severity::Mild);
        assert_eq!(enrich("acne", 0.7).severity, Severity::Moderate);
        assert_eq!(enrich("acne", 0.75).severity, Severity::Moderate);
    }

    #[test]
    fn test_acne_attention_is_strict() {
        assert!(!enrich("acne", 0.8).requires_attention);
        assert!(enrich("acne", 0.81).requires_attention);
    }

    #[test]
    fn test_eczema_severity_boundary() {
        assert_eq!(enrich("eczema", 0.59).severity, Severity::Mild);
        assert_eq!(enrich("eczema", 0.6).severity, Severity::Moderate);
        assert!(enrich("eczema", 0.2).requires_attention);
    }

    #[test]
    fn test_benign_flips_attention_at_high_confidence() {
        assert!(!enrich("nevus", 0.5).requires_attention);
        assert!(enrich("nevus", 0.85).requires_attention);
        assert!(!enrich("vascular_lesion", 0.7).requires_attention);
        assert!(enrich("vascular_lesion", 0.71).requires_attention);
        assert!(!enrich("seborrheic_keratosis", 0.99).requires_attention);
    }

    #[test]
    fn test_fixed_entries() {
        let c = enrich("normal_skin", 0.9);
        assert_eq!(c.condition_name, "Normal Skin");
        assert_eq!(c.severity, Severity::None);
        assert_eq!(c.category, "normal");
        assert!(!c.requires_attention);

        let c = enrich("melanoma_risk", 0.3);
        assert_eq!(c.severity, Severity::Severe);
        assert_eq!(c.category, "oncological");
        assert!(c.requires_attention);
    }

    #[test]
    fn test_fallback_for_unknown_label() {
        let c = enrich("basal_cell_carcinoma", 0.42);
        assert_eq!(c.label, "basal_cell_carcinoma");
        assert_eq!(c.condition_name, "Basal Cell Carcinoma");
        assert_eq!(c.severity, Severity::Unknown);
        assert_eq!(c.category, "unknown");
        assert_eq!(c.description, FALLBACK_DESCRIPTION);
        assert!(c.requires_attention);
        assert_eq!(c.confidence, 0.42);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("healthy_skin"), "Healthy Skin");
        assert_eq!(display_name("fungal_infection"), "Fungal Infection");
        assert_eq!(display_name("ROSACEA"), "Rosacea");
        assert_eq!(display_name("type2_lesion"), "Type2 Lesion");
    }

    #[test]
    fn test_table_labels_unique() {
        let mut labels: Vec<_> = CONDITION_INFO.iter().map(|i| i.label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), CONDITION_INFO.len());
    }
}
