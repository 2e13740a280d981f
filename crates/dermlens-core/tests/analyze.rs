//! End-to-end analysis through the public API.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use dermlens_core::classify::{enrich, ConditionClassifier};
use dermlens_core::embedding::{EmbeddingEngine, ImageEncoder};
use dermlens_core::scoring::{ConditionBank, CONDITION_PROMPTS};
use dermlens_core::{
    Config, ConditionProbabilities, ImageSource, PipelineError, Severity, SkinAnalyzer,
    VisualFeatures,
};
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::Array3;

fn analyzer() -> SkinAnalyzer {
    SkinAnalyzer::new(&Config::default()).unwrap()
}

fn write_image(dir: &Path, name: &str, img: &RgbImage, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    img.save_with_format(&path, format).unwrap();
    path
}

fn skin_tone(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([220, 180, 140]))
}

#[test]
fn uniform_skin_image_produces_ranked_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_image(dir.path(), "skin.jpg", &skin_tone(300, 300), ImageFormat::Jpeg);
    let analysis = analyzer().analyze(&ImageSource::from(path));

    assert!(!analysis.is_error(), "{:?}", analysis.image_metadata);
    assert!(analysis.processing_time > 0.0);
    assert!(analysis.conditions.len() <= 5);
    assert!(analysis
        .conditions
        .windows(2)
        .all(|w| w[0].confidence >= w[1].confidence));
    assert!(analysis.conditions.iter().all(|c| c.confidence > 0.10));

    let keys: BTreeSet<&str> = analysis.confidence_scores.keys().map(String::as_str).collect();
    let names: BTreeSet<&str> = analysis
        .conditions
        .iter()
        .map(|c| c.condition_name.as_str())
        .collect();
    assert_eq!(keys, names);
    for condition in &analysis.conditions {
        assert_eq!(
            analysis.confidence_scores[&condition.condition_name],
            condition.confidence
        );
    }
}

#[test]
fn analysis_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let img = RgbImage::from_fn(120, 90, |x, y| Rgb([(x * 2) as u8, (y * 2) as u8, 90]));
    let path = write_image(dir.path(), "lesion.png", &img, ImageFormat::Png);
    let source = ImageSource::from(path);

    let analyzer = analyzer();
    let first = analyzer.analyze(&source);
    let second = analyzer.analyze(&source);

    assert_eq!(first.conditions, second.conditions);
    assert_eq!(first.confidence_scores, second.confidence_scores);
    assert_ne!(first.analysis_id, second.analysis_id);
}

#[test]
fn text_file_named_jpg_is_corrupt_not_a_crash() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.jpg");
    std::fs::write(&path, "this is not an image\n").unwrap();
    let source = ImageSource::from(path);

    let analyzer = analyzer();
    let report = analyzer.validate(&source).unwrap();
    assert!(!report.valid);
    assert_eq!(report.reason.unwrap().kind(), "corrupt-image");

    let analysis = analyzer.analyze(&source);
    assert!(analysis.conditions.is_empty());
    assert!(analysis
        .image_metadata
        .error()
        .unwrap()
        .starts_with("Invalid image file"));
}

#[test]
fn oversize_is_reported_regardless_of_format() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.limits.max_file_size_bytes = 40;
    let analyzer = SkinAnalyzer::new(&config).unwrap();

    for (name, format) in [("a.png", ImageFormat::Png), ("b.bmp", ImageFormat::Bmp)] {
        let path = write_image(dir.path(), name, &skin_tone(50, 50), format);
        let report = analyzer.validate(&ImageSource::from(path)).unwrap();
        assert_eq!(report.reason.unwrap().kind(), "oversize", "{name}");
    }

    let path = dir.path().join("c.tiff");
    std::fs::write(&path, vec![0u8; 128]).unwrap();
    let report = analyzer.validate(&ImageSource::from(path)).unwrap();
    assert_eq!(report.reason.unwrap().kind(), "oversize");
}

#[test]
fn preprocess_is_fixed_shape_for_any_aspect_ratio() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = analyzer();
    for (w, h) in [(1, 1), (640, 480), (31, 977), (224, 224)] {
        let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 255]));
        let path = write_image(dir.path(), &format!("{w}x{h}.png"), &img, ImageFormat::Png);
        let tensor = analyzer.preprocess(&ImageSource::from(path)).unwrap();
        assert_eq!(tensor.shape(), &[224, 224, 3]);
        assert!(tensor.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}

#[test]
fn probabilities_form_a_distribution() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = analyzer();
    for (i, color) in [[0, 0, 0], [255, 255, 255], [180, 40, 40]].into_iter().enumerate() {
        let img = RgbImage::from_pixel(64, 64, Rgb(color));
        let path = write_image(dir.path(), &format!("{i}.png"), &img, ImageFormat::Png);
        let probs = analyzer.predict(&ImageSource::from(path)).unwrap();
        assert_eq!(probs.len(), CONDITION_PROMPTS.len());
        assert!(probs.iter().all(|(_, p)| p >= 0.0));
        assert!((probs.total() - 1.0).abs() < 1e-6);
    }
}

#[test]
fn acne_severity_flips_at_point_seven() {
    assert_eq!(enrich("acne", 0.65).severity, Severity::Mild);
    assert_eq!(enrich("acne", 0.7).severity, Severity::Moderate);
    assert_eq!(enrich("acne", 0.75).severity, Severity::Moderate);
}

#[test]
fn confidence_threshold_is_strict() {
    let probs = ConditionProbabilities::new(vec![
        ("acne".to_string(), 0.10),
        ("eczema".to_string(), 0.1000001),
        ("psoriasis".to_string(), 0.7999999),
    ]);
    let conditions = ConditionClassifier::default().classify(&probs);
    let labels: Vec<&str> = conditions.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["psoriasis", "eczema"]);
}

/// Encoder that always points at one row of a one-hot bank.
struct FixedEncoder {
    embedding: Vec<f32>,
}

impl ImageEncoder for FixedEncoder {
    fn name(&self) -> &str {
        "fixed"
    }

    fn embedding_dim(&self) -> usize {
        self.embedding.len()
    }

    fn encode(&self, _tensor: &Array3<f32>, _path: &Path) -> Result<Vec<f32>, PipelineError> {
        Ok(self.embedding.clone())
    }
}

#[test]
fn custom_encoder_aligned_with_one_label_wins() {
    let n = CONDITION_PROMPTS.len();
    let labels: Vec<String> = CONDITION_PROMPTS.iter().map(|p| p.label.to_string()).collect();
    let one_hot = |i: usize| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect::<Vec<f32>>();
    let bank = ConditionBank::from_embeddings(labels, (0..n).map(one_hot).collect()).unwrap();

    let psoriasis = CONDITION_PROMPTS
        .iter()
        .position(|p| p.label == "psoriasis")
        .unwrap();
    let engine = EmbeddingEngine::from_encoder(
        Box::new(FixedEncoder {
            embedding: one_hot(psoriasis),
        }),
        224,
    );

    let config = Config::default();
    let analyzer = SkinAnalyzer::from_parts(
        config.limits.clone(),
        engine,
        bank,
        &config.scoring,
        "fixed".into(),
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = write_image(dir.path(), "p.png", &skin_tone(32, 32), ImageFormat::Png);
    let analysis = analyzer.analyze(&ImageSource::from(path));

    assert_eq!(analysis.conditions.len(), 1);
    let top = &analysis.conditions[0];
    assert_eq!(top.condition_name, "Psoriasis");
    assert_eq!(top.severity, Severity::Moderate);
    assert!(top.requires_attention);
    assert!(top.confidence > 0.99);
}

#[test]
fn symmetry_of_mirrored_and_inverted_images() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = analyzer();

    let mirrored = RgbImage::from_fn(80, 40, |x, y| {
        let m = x.min(79 - x);
        Rgb([(m * 3) as u8, (y * 4) as u8, 200])
    });
    let path = write_image(dir.path(), "mirror.png", &mirrored, ImageFormat::Png);
    let features = analyzer.extract_features(&ImageSource::from(path));
    let score = features.blocks().unwrap().symmetry_analysis.vertical_symmetry_score;
    assert!((score - 1.0).abs() < 1e-9);

    let inverted = RgbImage::from_fn(80, 40, |x, _| {
        if x < 40 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    });
    let path = write_image(dir.path(), "inverted.png", &inverted, ImageFormat::Png);
    let features = analyzer.extract_features(&ImageSource::from(path));
    let score = features.blocks().unwrap().symmetry_analysis.vertical_symmetry_score;
    assert!(score.abs() < 1e-9);
}

#[test]
fn feature_extraction_on_garbage_returns_error_shape() {
    let source = ImageSource::from_bytes(b"GIF89a-truncated".to_vec(), Some("x.gif".into()));
    match analyzer().extract_features(&source) {
        VisualFeatures::Failed { error } => assert!(!error.is_empty()),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn uniform_image_shape_is_the_image_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_image(dir.path(), "skin.png", &skin_tone(300, 300), ImageFormat::Png);
    let features = analyzer().extract_features(&ImageSource::from(path));
    let shape = &features.blocks().unwrap().shape_features;
    assert!((shape.largest_area - 89401.0).abs() < 1e-6);
    assert!((shape.perimeter - 1196.0).abs() < 1e-6);
    assert!((shape.circularity - 0.785).abs() < 1e-3);
}

#[test]
fn file_without_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_image(dir.path(), "upload", &skin_tone(32, 32), ImageFormat::Png);
    let analyzer = analyzer();

    let report = analyzer.validate(&ImageSource::from(path.as_path())).unwrap();
    assert_eq!(report.reason.unwrap().kind(), "unsupported-format");

    let analysis = analyzer.analyze(&ImageSource::from(path));
    assert!(analysis.conditions.is_empty());
    assert_eq!(
        analysis.image_metadata.error(),
        Some("Unsupported image format: ")
    );
}
