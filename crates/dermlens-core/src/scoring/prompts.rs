//! Condition labels and the prompts that describe them to the text encoder.

use serde::Serialize;

/// One row of the label table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionPrompt {
    pub label: &'static str,
    pub prompt: &'static str,
}

/// Every condition the scorer ranks, in iteration order.
///
/// Order matters: it is the row order of the condition bank, the order of
/// similarity and probability maps, and the tie-break order when ranking.
pub const CONDITION_PROMPTS: &[ConditionPrompt] = &[
    ConditionPrompt {
        label: "healthy_skin",
        prompt: "a photograph of healthy normal skin",
    },
    ConditionPrompt {
        label: "acne",
        prompt: "a clinical image of acne with comedones and inflammatory lesions",
    },
    ConditionPrompt {
        label: "eczema",
        prompt: "a dermatology image showing eczema with red inflamed patches",
    },
    ConditionPrompt {
        label: "psoriasis",
        prompt: "a clinical photograph of psoriasis with scaly plaques",
    },
    ConditionPrompt {
        label: "fungal_infection",
        prompt: "a skin lesion that is a fungal infection with scaling",
    },
    ConditionPrompt {
        label: "melanoma",
        prompt: "a highly suspicious melanoma lesion requiring immediate attention",
    },
    ConditionPrompt {
        label: "basal_cell_carcinoma",
        prompt: "a clinical image of basal cell carcinoma",
    },
    ConditionPrompt {
        label: "seborrheic_keratosis",
        prompt: "a photograph of seborrheic keratosis with waxy appearance",
    },
    ConditionPrompt {
        label: "dermatitis",
        prompt: "a clinical image of contact dermatitis with inflammation",
    },
    ConditionPrompt {
        label: "rosacea",
        prompt: "a dermatology photograph showing rosacea with facial redness",
    },
];

/// Labels in table order.
pub fn labels() -> Vec<&'static str> {
    CONDITION_PROMPTS.iter().map(|p| p.label).collect()
}

/// Prompts in table order.
pub fn prompts() -> Vec<String> {
    CONDITION_PROMPTS.iter().map(|p| p.prompt.to_string()).collect()
}

/// Look up the prompt for a label.
pub fn prompt_for(label: &str) -> Option<&'static str> {
    CONDITION_PROMPTS
        .iter()
        .find(|p| p.label == label)
        .map(|p| p.prompt)
}

/// BLAKE3 digest identifying a prompt table encoded by a given encoder.
///
/// Any change to the encoder, its dimensionality, a label, a prompt or the
/// table order produces a different hash.
pub fn table_hash(encoder_id: &str, embedding_dim: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(encoder_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(&(embedding_dim as u64).to_le_bytes());
    for entry in CONDITION_PROMPTS {
        hasher.update(entry.label.as_bytes());
        hasher.update(b"\0");
        hasher.update(entry.prompt.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
