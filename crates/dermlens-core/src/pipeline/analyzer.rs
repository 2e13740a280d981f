//! Pipeline orchestration - wires together all analysis stages.

use std::path::Path;
use std::time::Instant;

use ndarray::Array3;
use serde::Serialize;
use uuid::Uuid;

use crate::classify::ConditionClassifier;
use crate::config::{Config, LimitsConfig, ScoringConfig};
use crate::embedding::EmbeddingEngine;
use crate::error::PipelineError;
use crate::features::{FeatureExtractor, VisualFeatures};
use crate::scoring::{self, ConditionBank, ConditionPrompt, ConditionScorer, CONDITION_PROMPTS};
use crate::types::{ConditionProbabilities, DetectedCondition, ImageMetadata, SkinAnalysis};

use super::decode::{DecodedImage, ImageDecoder};
use super::source::ImageSource;
use super::validate::{ValidationReport, Validator};

/// Description of the loaded models and the analysis contract.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_loaded: bool,
    pub backend: String,
    pub model: String,
    pub embedding_dim: usize,
    pub image_size: u32,
    pub temperature: f64,
    pub min_confidence: f64,
    pub max_conditions: usize,
    pub supported_formats: Vec<String>,
    pub max_image_size: u64,
    pub condition_classes: Vec<ConditionPrompt>,
}

/// Zero-shot skin condition analyzer.
///
/// Built once; the condition bank inside is immutable afterwards, so a
/// single analyzer can serve concurrent requests behind an `Arc`.
pub struct SkinAnalyzer {
    validator: Validator,
    engine: EmbeddingEngine,
    scorer: ConditionScorer,
    classifier: ConditionClassifier,
    model: String,
}

impl SkinAnalyzer {
    /// Load encoders and encode the condition prompts.
    ///
    /// Blocking: may run ONNX inference over every prompt. Call before
    /// dispatching any analysis.
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        let start = Instant::now();
        let model_dir = config.model_dir();

        let engine = EmbeddingEngine::load(&config.embedding, &model_dir)?;
        let text_encoder = scoring::load_text_encoder(&config.embedding, &model_dir)?;
        let bank = scoring::build_condition_bank(text_encoder.as_ref(), config)?;

        let analyzer = Self::from_parts(
            config.limits.clone(),
            engine,
            bank,
            &config.scoring,
            config.embedding.model.clone(),
        )?;

        tracing::info!(
            "Analyzer ready: {} backend, {} conditions x {} dims ({:?})",
            analyzer.engine.backend_name(),
            analyzer.scorer.bank().len(),
            analyzer.scorer.bank().embedding_dim(),
            start.elapsed()
        );
        Ok(analyzer)
    }

    /// Load a config file and build the analyzer it describes.
    pub fn from_config_file(path: &Path) -> crate::Result<Self> {
        let config = Config::load_from(path)?;
        Ok(Self::new(&config)?)
    }

    /// Assemble an analyzer from already-built components.
    pub fn from_parts(
        limits: LimitsConfig,
        engine: EmbeddingEngine,
        bank: ConditionBank,
        scoring: &ScoringConfig,
        model: String,
    ) -> Result<Self, PipelineError> {
        if engine.embedding_dim() != bank.embedding_dim() {
            return Err(PipelineError::Model {
                message: format!(
                    "Image encoder produces {} dimensions but condition bank has {}",
                    engine.embedding_dim(),
                    bank.embedding_dim()
                ),
            });
        }

        Ok(Self {
            validator: Validator::new(limits),
            engine,
            scorer: ConditionScorer::new(bank, scoring.temperature),
            classifier: ConditionClassifier::from_config(scoring),
            model,
        })
    }

    /// Check that a source exists, fits the limits and decodes.
    pub fn validate(&self, source: &ImageSource) -> Result<ValidationReport, PipelineError> {
        self.validator.validate(source)
    }

    /// Decode a source and report its properties.
    pub fn metadata(&self, source: &ImageSource) -> Result<ImageMetadata, PipelineError> {
        Ok(ImageDecoder::decode(source)?.metadata())
    }

    /// Decode and resize into the encoder's `[H, W, 3]` tensor.
    pub fn preprocess(&self, source: &ImageSource) -> Result<Array3<f32>, PipelineError> {
        let decoded = self.decode_for_preprocess(source)?;
        Ok(self.engine.preprocess(&decoded.image))
    }

    /// Probability of every condition for one image.
    pub fn predict(&self, source: &ImageSource) -> Result<ConditionProbabilities, PipelineError> {
        let tensor = self.preprocess(source)?;
        self.predict_tensor(&tensor, source)
    }

    /// Rank and enrich a probability distribution.
    pub fn postprocess(&self, probabilities: &ConditionProbabilities) -> Vec<DetectedCondition> {
        self.classifier.classify(probabilities)
    }

    /// Run the full analysis. Never fails.
    ///
    /// Any failure (including a rejected image) produces an analysis with
    /// no conditions and the error text in `image_metadata`.
    pub fn analyze(&self, source: &ImageSource) -> SkinAnalysis {
        let start = Instant::now();
        let analysis_id = Uuid::new_v4();
        let path = source.display_path();

        match self.try_analyze(source) {
            Ok((conditions, metadata)) => {
                let elapsed = start.elapsed().as_secs_f64();
                tracing::info!(
                    "Analyzed {:?} in {:.2}s ({} conditions)",
                    path,
                    elapsed,
                    conditions.len()
                );
                SkinAnalysis::completed(analysis_id, conditions, elapsed, metadata)
            }
            Err(message) => {
                let elapsed = start.elapsed().as_secs_f64();
                tracing::error!("Error analyzing image {:?}: {}", path, message);
                SkinAnalysis::failed(analysis_id, elapsed, message)
            }
        }
    }

    /// Compute handcrafted visual features. Never fails.
    pub fn extract_features(&self, source: &ImageSource) -> VisualFeatures {
        FeatureExtractor::extract(source)
    }

    pub fn model_info(&self) -> ModelInfo {
        let bank = self.scorer.bank();
        let limits = self.validator.limits();
        ModelInfo {
            model_loaded: true,
            backend: self.engine.backend_name().to_string(),
            model: self.model.clone(),
            embedding_dim: bank.embedding_dim(),
            image_size: self.engine.image_size(),
            temperature: self.scorer.temperature(),
            min_confidence: self.classifier.min_confidence(),
            max_conditions: self.classifier.max_conditions(),
            supported_formats: limits.supported_formats.clone(),
            max_image_size: limits.max_file_size_bytes,
            condition_classes: CONDITION_PROMPTS.to_vec(),
        }
    }

    pub fn bank(&self) -> &ConditionBank {
        self.scorer.bank()
    }

    fn try_analyze(
        &self,
        source: &ImageSource,
    ) -> Result<(Vec<DetectedCondition>, ImageMetadata), String> {
        let report = self.validate(source).map_err(|e| e.to_string())?;
        if let Some(reason) = report.reason {
            return Err(reason.to_string());
        }

        let decoded = self
            .decode_for_preprocess(source)
            .map_err(|e| e.to_string())?;
        let metadata = decoded.metadata();

        let stage = Instant::now();
        let tensor = self.engine.preprocess(&decoded.image);
        tracing::trace!("  Preprocess: {:?}", stage.elapsed());

        let probabilities = self
            .predict_tensor(&tensor, source)
            .map_err(|e| e.to_string())?;

        Ok((self.postprocess(&probabilities), metadata))
    }

    fn predict_tensor(
        &self,
        tensor: &Array3<f32>,
        source: &ImageSource,
    ) -> Result<ConditionProbabilities, PipelineError> {
        let stage = Instant::now();
        let embedding = self
            .engine
            .embed_preprocessed(tensor, &source.display_path())?;
        tracing::trace!("  Embed: {:?}", stage.elapsed());

        let stage = Instant::now();
        let probabilities = self.scorer.score(&embedding)?;
        tracing::trace!("  Score: {:?}", stage.elapsed());
        Ok(probabilities)
    }

    /// Decode after validation; any failure here is a preprocessing error.
    fn decode_for_preprocess(&self, source: &ImageSource) -> Result<DecodedImage, PipelineError> {
        ImageDecoder::decode(source).map_err(|e| PipelineError::Preprocess {
            path: source.display_path(),
            message: e.to_string(),
        })
    }
}
