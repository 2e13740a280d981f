//! Where an input image comes from: a file on disk or bytes already in memory.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// An image reference accepted by every analysis operation.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Image file on disk
    Path(PathBuf),
    /// Encoded image bytes, with an optional file name used for the extension check
    Bytes { data: Vec<u8>, name: Option<String> },
}

impl ImageSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn from_bytes(data: Vec<u8>, name: Option<String>) -> Self {
        Self::Bytes { data, name }
    }

    /// Path used to label log lines and errors.
    pub fn display_path(&self) -> PathBuf {
        match self {
            ImageSource::Path(path) => path.clone(),
            ImageSource::Bytes { name, .. } => {
                PathBuf::from(name.as_deref().unwrap_or("<memory>"))
            }
        }
    }

    /// Lowercase file extension without the dot, if the source has a name.
    pub fn extension(&self) -> Option<String> {
        let name: &Path = match self {
            ImageSource::Path(path) => path,
            ImageSource::Bytes { name, .. } => Path::new(name.as_deref()?),
        };
        name.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// Whether the source carries a file name (paths always do).
    pub fn is_named(&self) -> bool {
        match self {
            ImageSource::Path(_) => true,
            ImageSource::Bytes { name, .. } => name.is_some(),
        }
    }

    /// Whether the referenced image exists (always true for in-memory bytes).
    pub fn exists(&self) -> bool {
        match self {
            ImageSource::Path(path) => path.is_file(),
            ImageSource::Bytes { .. } => true,
        }
    }

    /// Size of the encoded image in bytes.
    pub fn size(&self) -> Result<u64, PipelineError> {
        match self {
            ImageSource::Path(path) => std::fs::metadata(path)
                .map(|m| m.len())
                .map_err(|e| Self::io_error(path, e)),
            ImageSource::Bytes { data, .. } => Ok(data.len() as u64),
        }
    }

    /// Read the encoded bytes. Borrowed for in-memory sources.
    pub fn read(&self) -> Result<Cow<'_, [u8]>, PipelineError> {
        match self {
            ImageSource::Path(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|e| Self::io_error(path, e)),
            ImageSource::Bytes { data, .. } => Ok(Cow::Borrowed(data)),
        }
    }

    fn io_error(path: &Path, e: std::io::Error) -> PipelineError {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipelineError::FileNotFound(path.to_path_buf())
        } else {
            PipelineError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_path_is_lowercased() {
        let source = ImageSource::from("/photos/Arm.JPG");
        assert_eq!(source.extension().as_deref(), Some("jpg"));
    }

    #[test]
    fn test_extension_from_bytes_name() {
        let source = ImageSource::from_bytes(vec![1, 2, 3], Some("upload.png".into()));
        assert_eq!(source.extension().as_deref(), Some("png"));
        assert_eq!(source.size().unwrap(), 3);

        let anonymous = ImageSource::from_bytes(vec![], None);
        assert!(anonymous.extension().is_none());
        assert!(!anonymous.is_named());
        assert!(source.is_named());
        assert_eq!(anonymous.display_path(), PathBuf::from("<memory>"));
    }

    #[test]
    fn test_read_missing_file_maps_to_not_found() {
        let source = ImageSource::from("/nonexistent/lesion.jpg");
        assert!(!source.exists());
        assert!(matches!(
            source.read(),
            Err(PipelineError::FileNotFound(_))
        ));
    }
}
