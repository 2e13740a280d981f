//! Grayscale intensity statistics.

use image::GrayImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureFeatures {
    /// Population variance of gray levels
    pub texture_variance: f64,
    pub texture_mean: f64,
    /// Max minus min gray level
    pub texture_contrast: f64,
}

pub fn analyze(gray: &GrayImage) -> TextureFeatures {
    let n = (gray.width() as f64 * gray.height() as f64).max(1.0);
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut min = u8::MAX;
    let mut max = u8::MIN;

    for pixel in gray.pixels() {
        let v = pixel[0];
        sum += v as f64;
        sum_sq += (v as f64) * (v as f64);
        min = min.min(v);
        max = max.max(v);
    }

    let mean = sum / n;
    TextureFeatures {
        texture_variance: (sum_sq / n - mean * mean).max(0.0),
        texture_mean: mean,
        texture_contrast: max.saturating_sub(min) as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_flat_image_has_no_texture() {
        let t = analyze(&GrayImage::from_pixel(16, 16, Luma([90])));
        assert_eq!(t.texture_mean, 90.0);
        assert!(t.texture_variance.abs() < 1e-9);
        assert_eq!(t.texture_contrast, 0.0);
    }

    #[test]
    fn test_checkerboard() {
        let img = GrayImage::from_fn(8, 8, |x, y| Luma([if (x + y) % 2 == 0 { 0 } else { 100 }]));
        let t = analyze(&img);
        assert!((t.texture_mean - 50.0).abs() < 1e-9);
        assert!((t.texture_variance - 2500.0).abs() < 1e-9);
        assert_eq!(t.texture_contrast, 100.0);
    }
}
