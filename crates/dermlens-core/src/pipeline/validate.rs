//! Input validation before analysis.

use serde::{Deserialize, Serialize};

use crate::config::LimitsConfig;
use crate::error::{PipelineError, ValidationFailure};

use super::decode::{format_to_string, ImageDecoder};
use super::source::ImageSource;

/// Outcome of validating one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ValidationFailure>,
}

impl ValidationReport {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn rejected(reason: ValidationFailure) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Validates images before preprocessing.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Validate an image without modifying it.
    ///
    /// Checks, in order:
    /// - The image exists
    /// - Its size is within limits (regardless of format)
    /// - Its extension is on the allow-list; a name without an extension is
    ///   rejected, and only unnamed bytes are judged by their sniffed format
    /// - It has valid image magic bytes and decodes fully
    ///
    /// Expected rejections come back as a negative report. Only unexpected
    /// I/O failures on an existing file are returned as `Err`.
    pub fn validate(&self, source: &ImageSource) -> Result<ValidationReport, PipelineError> {
        if !source.exists() {
            return Ok(ValidationReport::rejected(ValidationFailure::NotFound));
        }

        let size = source.size()?;
        if size > self.limits.max_file_size_bytes {
            return Ok(ValidationReport::rejected(ValidationFailure::Oversize {
                size,
                max: self.limits.max_file_size_bytes,
            }));
        }

        // Only unnamed bytes fall through to the sniffed format below.
        let extension = source.extension();
        let rejected_extension = match &extension {
            Some(ext) if self.limits.is_supported_extension(ext) => None,
            Some(ext) => Some(format!(".{ext}")),
            None if source.is_named() => Some(String::new()),
            None => None,
        };
        if let Some(extension) = rejected_extension {
            return Ok(ValidationReport::rejected(
                ValidationFailure::UnsupportedFormat { extension },
            ));
        }

        let bytes = source.read()?;

        if !Self::is_valid_image_header(&bytes) {
            return Ok(ValidationReport::rejected(ValidationFailure::CorruptImage {
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            }));
        }

        let decoded = match ImageDecoder::decode_bytes(&bytes, &source.display_path()) {
            Ok(decoded) => decoded,
            Err(e) => {
                return Ok(ValidationReport::rejected(ValidationFailure::CorruptImage {
                    message: e.to_string(),
                }))
            }
        };

        if extension.is_none() {
            let sniffed = format_to_string(decoded.format);
            if !self.limits.is_supported_extension(&sniffed) {
                return Ok(ValidationReport::rejected(
                    ValidationFailure::UnsupportedFormat { extension: sniffed },
                ));
            }
        }

        Ok(ValidationReport::accepted())
    }

    /// Check if the header bytes match a known image format.
    fn is_valid_image_header(bytes: &[u8]) -> bool {
        if bytes.len() < 4 {
            return false;
        }
        let header = &bytes[..bytes.len().min(12)];

        // JPEG: FF D8 FF
        if header[0] == 0xFF && header[1] == 0xD8 && header[2] == 0xFF {
            return true;
        }

        // PNG: 89 50 4E 47
        if header[..4] == [0x89, b'P', b'N', b'G'] {
            return true;
        }

        // WebP: RIFF....WEBP
        if &header[..4] == b"RIFF" {
            return header.len() >= 12 && &header[8..12] == b"WEBP";
        }

        // BMP: BM
        if header[0] == b'B' && header[1] == b'M' {
            return true;
        }

        // GIF and TIFF pass here so unnamed sources reach the format check
        // with a precise reason.
        if &header[..4] == b"GIF8" {
            return true;
        }
        let is_tiff_le = header[..4] == [b'I', b'I', 0x2A, 0x00];
        let is_tiff_be = header[..4] == [b'M', b'M', 0x00, 0x2A];
        is_tiff_le || is_tiff_be
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encoded(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(16, 16, Rgb([220, 180, 140]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn validator() -> Validator {
        Validator::new(LimitsConfig::default())
    }

    #[test]
    fn test_magic_bytes_jpeg() {
        assert!(Validator::is_valid_image_header(&[
            0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0
        ]));
    }

    #[test]
    fn test_magic_bytes_png() {
        assert!(Validator::is_valid_image_header(&[
            0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A
        ]));
    }

    #[test]
    fn test_magic_bytes_webp() {
        assert!(Validator::is_valid_image_header(b"RIFF\0\0\0\0WEBP"));
        assert!(!Validator::is_valid_image_header(b"RIFF\0\0\0\0WAVE"));
    }

    #[test]
    fn test_magic_bytes_invalid() {
        assert!(!Validator::is_valid_image_header(b"hello world!"));
        assert!(!Validator::is_valid_image_header(&[0xFF, 0xD8]));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let report = validator()
            .validate(&ImageSource::from("nonexistent.jpg"))
            .unwrap();
        assert!(!report.valid);
        assert_eq!(report.reason, Some(ValidationFailure::NotFound));
    }

    #[test]
    fn test_supported_formats_are_valid() {
        let dir = tempfile::tempdir().unwrap();
        for (name, format) in [
            ("a.jpg", ImageFormat::Jpeg),
            ("b.jpeg", ImageFormat::Jpeg),
            ("c.png", ImageFormat::Png),
            ("d.bmp", ImageFormat::Bmp),
            ("e.webp", ImageFormat::WebP),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, encoded(format)).unwrap();
            let report = validator().validate(&ImageSource::from(path)).unwrap();
            assert!(report.valid, "{name} should be valid: {:?}", report.reason);
        }
    }

    #[test]
    fn test_oversize_wins_over_format() {
        let limits = LimitsConfig {
            max_file_size_bytes: 8,
            ..LimitsConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"this is definitely more than eight bytes").unwrap();

        let report = Validator::new(limits)
            .validate(&ImageSource::from(path))
            .unwrap();
        assert_eq!(report.reason.unwrap().kind(), "oversize");
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesion.gif");
        std::fs::write(&path, encoded(ImageFormat::Png)).unwrap();
        let report = validator().validate(&ImageSource::from(path)).unwrap();
        assert_eq!(
            report.reason,
            Some(ValidationFailure::UnsupportedFormat {
                extension: ".gif".into()
            })
        );
    }

    #[test]
    fn test_text_file_with_jpg_extension_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, "not an image, just some text\n").unwrap();
        let report = validator().validate(&ImageSource::from(path)).unwrap();
        assert!(!report.valid);
        assert_eq!(report.reason.unwrap().kind(), "corrupt-image");
    }

    #[test]
    fn test_truncated_jpeg_is_corrupt() {
        let mut bytes = encoded(ImageFormat::Jpeg);
        bytes.truncate(40);
        let source = ImageSource::from_bytes(bytes, Some("cut.jpg".into()));
        let report = validator().validate(&source).unwrap();
        assert_eq!(report.reason.unwrap().kind(), "corrupt-image");
    }

    #[test]
    fn test_unnamed_bytes_use_sniffed_format() {
        let png = ImageSource::from_bytes(encoded(ImageFormat::Png), None);
        assert!(validator().validate(&png).unwrap().valid);

        let gif = ImageSource::from_bytes(encoded(ImageFormat::Gif), None);
        let report = validator().validate(&gif).unwrap();
        assert_eq!(report.reason.unwrap().kind(), "unsupported-format");
    }

    #[test]
    fn test_named_source_without_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload");
        std::fs::write(&path, encoded(ImageFormat::Png)).unwrap();
        let report = validator().validate(&ImageSource::from(path)).unwrap();
        assert_eq!(
            report.reason,
            Some(ValidationFailure::UnsupportedFormat {
                extension: String::new()
            })
        );

        let named = ImageSource::from_bytes(encoded(ImageFormat::Png), Some("upload".into()));
        let report = validator().validate(&named).unwrap();
        assert!(!report.valid);
        assert_eq!(report.reason.unwrap().kind(), "unsupported-format");
    }

    #[test]
    fn test_report_serialization() {
        let json = serde_json::to_string(&ValidationReport::accepted()).unwrap();
        assert_eq!(json, r#"{"valid":true}"#);
        let json =
            serde_json::to_string(&ValidationReport::rejected(ValidationFailure::NotFound))
                .unwrap();
        assert!(json.contains("\"kind\":\"not-found\""));
    }
}
