//! Image preprocessing for the image encoder.
//!
//! Produces the canonical input tensor:
//! - Input size: `image_size × image_size` (224 by default)
//! - Channel order: RGB, alpha dropped
//! - Values: pixels linearly scaled to [0, 1] as f32
//! - Tensor layout: HWC [height, width, channels]
//!
//! Encoder-specific normalization (mean/std, NCHW) is applied by the encoder.

use image::DynamicImage;
use ndarray::Array3;

/// Number of color channels (RGB).
pub const CHANNELS: usize = 3;

/// Preprocess an image for embedding.
///
/// Converts to RGB first, then resizes with Lanczos3 so that downscaling
/// does not alias. Deterministic: identical input pixels give an identical
/// tensor.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> Array3<f32> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let resized = rgb
        .resize_exact(
            image_size,
            image_size,
            image::imageops::FilterType::Lanczos3,
        )
        .to_rgb8();

    let size = image_size as usize;
    let raw = resized.as_raw();
    Array3::from_shape_fn((size, size, CHANNELS), |(y, x, c)| {
        raw[(y * size + x) * CHANNELS + c] as f32 / 255.0
    })
}
