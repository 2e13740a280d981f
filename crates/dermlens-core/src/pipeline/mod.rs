//! Image analysis pipeline components.
//!
//! This module contains all the stages of the analysis pipeline:
//! - **source**: Paths or in-memory buffers to analyze
//! - **validate**: Existence, size, format and integrity checks
//! - **decode**: Load and decode images, derive metadata
//! - **discovery**: Find image files in directories
//! - **analyzer**: Orchestrates validate → preprocess → embed → score → classify
//! - **batch**: Bounded-concurrency analysis of many images

pub mod analyzer;
pub mod batch;
pub mod decode;
pub mod discovery;
pub mod source;
pub mod validate;

// Re-exports for convenient access
pub use analyzer::{ModelInfo, SkinAnalyzer};
pub use batch::{analyze_batch, analyze_stream};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use source::ImageSource;
pub use validate::{ValidationReport, Validator};
