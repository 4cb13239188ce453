//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the policyscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyscanConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Company detection configuration.
    pub detection: DetectionConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Validation thresholds.
    pub validation: ValidationConfig,

    /// Review routing thresholds.
    pub review: ReviewConfig,
}

/// OCR engine configuration, passed to the text recognizer at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing the detection/recognition models.
    pub model_dir: PathBuf,

    /// Detection model file name.
    pub detection_model: String,

    /// Recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Drop recognized lines below this confidence (0.0 - 1.0).
    pub recognition_threshold: f32,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,

    /// Binarization applied to regions before recognition.
    pub threshold: ThresholdMethod,

    /// Invert binarized regions (light text on dark background).
    pub invert: bool,

    /// Apply a 3x3 median filter before binarization.
    pub denoise: bool,

    /// Estimate and correct small rotations of whole pages.
    pub deskew: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            recognition_threshold: 0.0,
            keep_unk: false,
            threshold: ThresholdMethod::Otsu,
            invert: false,
            denoise: false,
            deskew: false,
        }
    }
}

/// Binarization method for OCR input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Grayscale only.
    None,
    /// Global threshold chosen by Otsu's method.
    #[default]
    Otsu,
    /// Local mean threshold, better on unevenly lit scans.
    Adaptive,
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI requested when rasterizing pages.
    pub render_dpi: u32,

    /// Maximum pages to rasterize and OCR (0 = unlimited).
    pub max_pages: usize,

    /// Use embedded text before falling back to OCR.
    pub prefer_embedded_text: bool,

    /// Minimum embedded text length to treat the PDF as text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            max_pages: 3,
            prefer_embedded_text: true,
            min_text_length: 100,
        }
    }
}

/// Company detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Confidence below which the generic company is reported.
    pub threshold: f32,

    /// Multiplier applied to the matched-marker ratio in text mode.
    pub base_confidence: f32,

    /// Number of leading characters scanned in text mode.
    pub text_prefix_chars: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.70,
            base_confidence: 1.0,
            text_prefix_chars: 3000,
        }
    }
}

/// Which strategy family the pipeline uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Images use coordinate regions, text uses patterns.
    #[default]
    Auto,
    /// Always use coordinate regions.
    Coordinates,
    /// Always use text patterns (images are OCR'd first).
    Patterns,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Strategy family selection.
    pub mode: ExtractionMode,

    /// Confidence below which the generic strategy is used.
    pub strategy_threshold: f32,

    /// Additional region templates and pattern tables (JSON).
    pub strategy_file: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Auto,
            strategy_threshold: 0.70,
            strategy_file: None,
        }
    }
}

/// Inclusive numeric range for plausibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
}

impl AmountRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Validation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub coverage_amount: AmountRange,
    pub liability_coverage: AmountRange,
    pub deductible: AmountRange,
    pub premium_amount: AmountRange,

    /// Earliest plausible policy year.
    pub min_year: i32,

    /// Latest plausible policy year.
    pub max_year: i32,

    /// Shortest plausible policy term in days.
    pub min_term_days: i64,

    /// Longest plausible policy term in days.
    pub max_term_days: i64,

    /// Extraction confidence (0-100) below which a warning is raised.
    pub low_confidence: f32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            coverage_amount: AmountRange::new(1_000.0, 1_000_000.0),
            liability_coverage: AmountRange::new(10_000.0, 10_000_000.0),
            deductible: AmountRange::new(100.0, 10_000.0),
            premium_amount: AmountRange::new(50.0, 10_000.0),
            min_year: 1990,
            max_year: 2050,
            min_term_days: 30,
            max_term_days: 400,
            low_confidence: 50.0,
        }
    }
}

/// Thresholds routing records to a human reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Extraction confidence (0-100) below which a record is flagged.
    pub min_confidence: f32,

    /// Warning count at which a record is flagged.
    pub max_warnings: usize,

    /// Number of missing critical fields at which a record is flagged.
    pub max_missing_critical: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            min_confidence: 70.0,
            max_warnings: 3,
            max_missing_critical: 2,
        }
    }
}

impl PolicyscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
