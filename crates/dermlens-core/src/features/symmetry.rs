//! Left-right mirror symmetry.

use image::RgbImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymmetryAnalysis {
    /// 1.0 for a perfect mirror image, 0.0 for maximal difference
    pub vertical_symmetry_score: f64,
}

/// Compare the left half against the mirrored right half.
///
/// For odd widths the middle column belongs to the right half and is
/// dropped when the halves are aligned. Images narrower than 2 px have no
/// pixels to compare and score 0.0.
pub fn analyze(image: &RgbImage) -> SymmetryAnalysis {
    let (width, height) = image.dimensions();
    let half = width / 2;
    if half == 0 || height == 0 {
        return SymmetryAnalysis {
            vertical_symmetry_score: 0.0,
        };
    }

    let mut total_diff = 0.0f64;
    for y in 0..height {
        for x in 0..half {
            let left = image.get_pixel(x, y);
            let right = image.get_pixel(width - 1 - x, y);
            for c in 0..3 {
                total_diff += (left[c] as f64 - right[c] as f64).abs();
            }
        }
    }

    let count = half as f64 * height as f64 * 3.0;
    SymmetryAnalysis {
        vertical_symmetry_score: 1.0 - (total_diff / count) / 255.0,
    }
}
