//! Image decoding with content-based format detection.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::PipelineError;
use crate::types::ImageMetadata;

use super::source::ImageSource;

/// Decodes encoded image bytes into pixels.
pub struct ImageDecoder;

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Encoded size in bytes
    pub file_size: u64,
}

impl DecodedImage {
    /// Snapshot of the decoded image's properties.
    pub fn metadata(&self) -> ImageMetadata {
        let color = self.image.color();
        ImageMetadata {
            width: self.width,
            height: self.height,
            channels: color.channel_count(),
            format: format_to_string(self.format),
            size_bytes: self.file_size,
            has_alpha: color.has_alpha(),
        }
    }
}

impl ImageDecoder {
    /// Read and decode an image source.
    pub fn decode(source: &ImageSource) -> Result<DecodedImage, PipelineError> {
        let bytes = source.read()?;
        Self::decode_bytes(&bytes, &source.display_path())
    }

    /// Decode an in-memory buffer. The format is sniffed from the content,
    /// falling back to the path's extension.
    pub fn decode_bytes(bytes: &[u8], path: &Path) -> Result<DecodedImage, PipelineError> {
        let file_size = bytes.len() as u64;
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = match reader.format() {
            Some(f) => f,
            None => ImageFormat::from_path(path).map_err(|_| PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format".to_string(),
            })?,
        };
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Image has no pixels ({width}x{height})"),
            });
        }

        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size,
        })
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}
