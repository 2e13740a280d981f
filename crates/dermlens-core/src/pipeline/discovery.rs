//! File discovery for finding images in directories.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::LimitsConfig;

/// Discovers image files in directories.
pub struct FileDiscovery {
    limits: LimitsConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Discover all supported image files at a path.
    ///
    /// A file path is returned as-is so validation can explain why it is
    /// rejected; a directory is walked recursively for supported extensions.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            return std::fs::metadata(path)
                .map(|meta| {
                    vec![DiscoveredFile {
                        path: path.to_path_buf(),
                        size: meta.len(),
                    }]
                })
                .unwrap_or_default();
        }

        let mut files: Vec<DiscoveredFile> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.path().is_file() && self.is_supported(entry.path()))
            .filter_map(|entry| {
                let size = entry.metadata().ok()?.len();
                Some(DiscoveredFile {
                    path: entry.path().to_path_buf(),
                    size,
                })
            })
            .collect();

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.limits.is_supported_extension(ext))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "nested/c.webp", "d.gif"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = FileDiscovery::new(LimitsConfig::default()).discover(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|f| {
                f.path
                    .strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "nested/c.webp"]);
    }

    #[test]
    fn test_discover_single_file_is_returned_unfiltered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tiff");
        std::fs::write(&path, b"1234").unwrap();
        let files = FileDiscovery::new(LimitsConfig::default()).discover(&path);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 4);
    }

    #[test]
    fn test_discover_missing_path_is_empty() {
        let files =
            FileDiscovery::new(LimitsConfig::default()).discover(Path::new("/nonexistent/dir"));
        assert!(files.is_empty());
    }
}
