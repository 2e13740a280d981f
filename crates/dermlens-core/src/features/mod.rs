//! Handcrafted visual features.
//!
//! Four independent statistic blocks computed on the raw decoded image,
//! not on the encoder tensor. These are supporting signal only: any failure
//! turns into an `{ "error": ... }` report instead of an `Err`.

pub mod color;
pub mod shape;
pub mod symmetry;
pub mod texture;

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

use crate::pipeline::{ImageDecoder, ImageSource};

pub use color::ColorAnalysis;
pub use shape::ShapeFeatures;
pub use symmetry::SymmetryAnalysis;
pub use texture::TextureFeatures;

/// The four feature blocks for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBlocks {
    pub color_analysis: ColorAnalysis,
    pub texture_features: TextureFeatures,
    pub shape_features: ShapeFeatures,
    pub symmetry_analysis: SymmetryAnalysis,
}

/// Result of feature extraction: the blocks, or a single error field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VisualFeatures {
    Extracted(FeatureBlocks),
    Failed { error: String },
}

impl VisualFeatures {
    pub fn blocks(&self) -> Option<&FeatureBlocks> {
        match self {
            VisualFeatures::Extracted(blocks) => Some(blocks),
            VisualFeatures::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            VisualFeatures::Failed { error } => Some(error),
            VisualFeatures::Extracted(_) => None,
        }
    }
}

/// Computes [`VisualFeatures`] from an image.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Decode a source and extract all blocks. Never fails.
    pub fn extract(source: &ImageSource) -> VisualFeatures {
        match ImageDecoder::decode(source) {
            Ok(decoded) => VisualFeatures::Extracted(Self::extract_image(&decoded.image)),
            Err(e) => {
                tracing::error!(
                    "Error extracting visual features from {:?}: {e}",
                    source.display_path()
                );
                VisualFeatures::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Extract all blocks from an already-decoded image.
    pub fn extract_image(image: &DynamicImage) -> FeatureBlocks {
        let rgb = image.to_rgb8();
        let gray = grayscale(&rgb);
        FeatureBlocks {
            color_analysis: color::analyze(&rgb),
            texture_features: texture::analyze(&gray),
            shape_features: shape::analyze(&gray),
            symmetry_analysis: symmetry::analyze(&rgb),
        }
    }
}

/// ITU-R BT.601 luma, rounded to the nearest level.
pub fn grayscale(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let p = rgb.get_pixel(x, y);
        let luma = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}
