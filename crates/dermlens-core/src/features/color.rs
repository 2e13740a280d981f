//! Per-channel color statistics.

use image::RgbImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorAnalysis {
    /// Mean of R, G, B over all pixels
    pub mean_rgb: [f64; 3],
    /// Population standard deviation of R, G, B
    pub std_rgb: [f64; 3],
    /// Index (0 = R, 1 = G, 2 = B) of the largest mean; first wins on ties
    pub dominant_color_channel: usize,
}

pub fn analyze(image: &RgbImage) -> ColorAnalysis {
    let n = (image.width() as f64 * image.height() as f64).max(1.0);
    let mut sum = [0.0f64; 3];
    let mut sum_sq = [0.0f64; 3];

    for pixel in image.pixels() {
        for c in 0..3 {
            let v = pixel[c] as f64;
            sum[c] += v;
            sum_sq[c] += v * v;
        }
    }

    let mean_rgb = sum.map(|s| s / n);
    let mut std_rgb = [0.0; 3];
    for c in 0..3 {
        std_rgb[c] = (sum_sq[c] / n - mean_rgb[c] * mean_rgb[c]).max(0.0).sqrt();
    }

    let mut dominant_color_channel = 0;
    for c in 1..3 {
        if mean_rgb[c] > mean_rgb[dominant_color_channel] {
            dominant_color_channel = c;
        }
    }

    ColorAnalysis {
        mean_rgb,
        std_rgb,
        dominant_color_channel,
    }
}
