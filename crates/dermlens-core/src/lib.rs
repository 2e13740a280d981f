//! DermLens Core - zero-shot skin condition analysis.
//!
//! Takes a single photograph and returns a ranked list of candidate skin
//! conditions with confidence, severity and a clinical-attention flag, plus
//! an independent set of handcrafted visual features.
//!
//! # Architecture
//!
//! ```text
//! Image → Validate → Preprocess (224×224×3, [0,1]) → Embed ─┐
//!                                                           ├→ Cosine → Softmax(T) → Classify → SkinAnalysis
//!                          Condition prompts → Encode once ─┘
//!
//! Image → Decode → Color / Texture / Shape / Symmetry → VisualFeatures
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use dermlens_core::{Config, ImageSource, SkinAnalyzer};
//!
//! let config = Config::load()?;
//! let analyzer = SkinAnalyzer::new(&config)?;
//!
//! let source = ImageSource::from("./lesion.jpg");
//! if analyzer.validate(&source)?.valid {
//!     let analysis = analyzer.analyze(&source);
//!     for condition in &analysis.conditions {
//!         println!("{}: {:.2}", condition.condition_name, condition.confidence);
//!     }
//! }
//! ```

// Module declarations
pub mod classify;
pub mod config;
pub mod embedding;
pub mod error;
pub mod features;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod types;

// Re-exports for convenient access
pub use config::{
    Config, CONFIDENCE_THRESHOLD, MAX_CONDITIONS, MAX_IMAGE_SIZE_BYTES, SOFTMAX_TEMPERATURE,
    SUPPORTED_FORMATS, TARGET_RESOLUTION,
};
pub use embedding::EmbeddingEngine;
pub use error::{ConfigError, DermError, PipelineError, PipelineResult, Result, ValidationFailure};
pub use features::{FeatureExtractor, VisualFeatures};
pub use output::{AnalysisRecord, FeatureRecord, OutputFormat, OutputWriter};
pub use pipeline::{
    analyze_batch, analyze_stream, DiscoveredFile, FileDiscovery, ImageSource, ModelInfo,
    SkinAnalyzer, ValidationReport,
};
pub use types::{
    ConditionProbabilities, DetectedCondition, ImageMetadata, MetadataPayload, Severity,
    SimilarityScores, SkinAnalysis,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
