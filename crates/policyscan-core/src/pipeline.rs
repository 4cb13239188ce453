//! Single-call document processing: acquire, detect, extract, validate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::detect::{CompanyDetector, DetectionResult};
use crate::error::{InputError, PdfError, Result};
use crate::extract::{Content, FieldExtractor};
use crate::models::company::Company;
use crate::models::config::{ExtractionMode, PolicyscanConfig};
use crate::models::record::{ExtractedRecord, Field};
use crate::ocr::{RegionPreparator, TextAcquirer, TextRecognizer};
use crate::pdf::{LopdfRasterizer, PageRasterizer, PdfDocument};
use crate::strategy::{
    StrategyFile, StrategyKind, StrategyRegistry, coordinate_builder, pattern_builder,
};
use crate::validate::{ReviewPolicy, ValidationVerdict, Validator};

/// Kind of document, decided from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Pdf,
    Image,
    Text,
}

impl SourceKind {
    pub const IMAGE_EXTENSIONS: &'static [&'static str] =
        &["png", "jpg", "jpeg", "tiff", "tif", "bmp"];

    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(SourceKind::Pdf),
            "txt" => Some(SourceKind::Text),
            e if Self::IMAGE_EXTENSIONS.contains(&e) => Some(SourceKind::Image),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> std::result::Result<Self, InputError> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| InputError::UnsupportedFormat(path.display().to_string()))
    }
}

/// A document to process.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Path(PathBuf),
    Bytes { data: Vec<u8>, kind: SourceKind },
    Text(String),
    Image(DynamicImage),
}

impl DocumentSource {
    fn name(&self) -> Option<String> {
        match self {
            DocumentSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            _ => None,
        }
    }
}

/// Everything known about one processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub source_kind: SourceKind,
    pub detection: DetectionResult,
    pub strategy: StrategyKind,
    pub record: ExtractedRecord,
    /// Completeness of the record, 0-100.
    pub extraction_confidence: f32,
    pub verdict: ValidationVerdict,
    pub needs_review: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub review_reasons: Vec<String>,
    pub processing_time_ms: u64,
}

impl ProcessOutcome {
    /// Replace a field with a reviewer-supplied value.
    ///
    /// The verdict is recomputed and the record counts as reviewed.
    pub fn apply_correction(&mut self, field: Field, value: impl Into<String>, validator: &Validator) {
        self.record.set(field, value);
        self.extraction_confidence = self.record.completeness();
        self.verdict = validator.validate(&self.record, self.extraction_confidence);
        self.needs_review = false;
        self.review_reasons.clear();
        debug!("Corrected {}; {} errors remain", field, self.verdict.errors.len());
    }
}

/// Content ready for detection and extraction.
enum Loaded {
    Text(String),
    Pages(Vec<DynamicImage>),
}

/// Shared, read-only processing pipeline.
pub struct Pipeline {
    config: PolicyscanConfig,
    detector: CompanyDetector,
    regions: StrategyRegistry,
    patterns: StrategyRegistry,
    extractor: FieldExtractor,
    validator: Validator,
    review: ReviewPolicy,
    rasterizer: Arc<dyn PageRasterizer>,
}

impl Pipeline {
    /// Build the pipeline, merging `extraction.strategy_file` when set.
    pub fn new(config: PolicyscanConfig) -> Result<Self> {
        let mut regions = coordinate_builder();
        let mut patterns = pattern_builder();

        if let Some(path) = &config.extraction.strategy_file {
            StrategyFile::from_file(path)?.apply(&mut regions, &mut patterns)?;
        }

        let threshold = config.extraction.strategy_threshold;
        Ok(Self {
            detector: CompanyDetector::from_config(&config.detection),
            regions: regions.with_threshold(threshold).build()?,
            patterns: patterns.with_threshold(threshold).build()?,
            extractor: FieldExtractor::new(),
            validator: Validator::from_config(&config.validation),
            review: ReviewPolicy::from_config(&config.review),
            rasterizer: Arc::new(LopdfRasterizer),
            config,
        })
    }

    /// Enable image input.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        let acquirer = TextAcquirer::new(recognizer)
            .with_preparator(RegionPreparator::from_config(&self.config.ocr));
        self.extractor = FieldExtractor::new().with_acquirer(acquirer);
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn config(&self) -> &PolicyscanConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn has_ocr(&self) -> bool {
        self.extractor.acquirer().is_some()
    }

    /// Strategy table for an extraction kind.
    pub fn registry(&self, kind: StrategyKind) -> &StrategyRegistry {
        match kind {
            StrategyKind::Region => &self.regions,
            StrategyKind::Pattern => &self.patterns,
        }
    }

    /// Process one document. `company` skips detection.
    ///
    /// Fails only when the source cannot be read at all.
    pub fn process(&self, source: DocumentSource, company: Option<Company>) -> Result<ProcessOutcome> {
        let start = Instant::now();
        let name = source.name();
        let (source_kind, loaded) = self.load(source)?;
        info!(
            "Processing {} ({:?})",
            name.as_deref().unwrap_or("<memory>"),
            source_kind
        );

        let acquirer = self.extractor.acquirer();
        let detection = match (company, &loaded, acquirer) {
            (Some(company), _, _) => {
                info!("Using company override {}", company);
                DetectionResult::overridden(company)
            }
            (None, Loaded::Text(text), _) => self.detector.detect_text(text),
            (None, Loaded::Pages(pages), Some(acquirer)) => {
                self.detector.detect_regions(&pages[0], acquirer)
            }
            (None, Loaded::Pages(_), None) => return Err(InputError::OcrUnavailable.into()),
        };

        let kind = match (self.config.extraction.mode, &loaded) {
            (ExtractionMode::Coordinates, _) => StrategyKind::Region,
            (ExtractionMode::Patterns, _) => StrategyKind::Pattern,
            (ExtractionMode::Auto, Loaded::Text(_)) => StrategyKind::Pattern,
            (ExtractionMode::Auto, Loaded::Pages(_)) => StrategyKind::Region,
        };
        let strategy = self
            .registry(kind)
            .select(detection.company, detection.confidence);
        debug!("Selected {:?} strategy for {}", kind, strategy.company());

        let extraction = match (&loaded, kind) {
            (Loaded::Text(text), _) => self.extractor.extract(Content::Text(text), strategy),
            (Loaded::Pages(pages), StrategyKind::Pattern) if pages.len() > 1 => {
                let text = self.read_pages(pages)?;
                self.extractor.extract(Content::Text(&text), strategy)
            }
            (Loaded::Pages(pages), _) => self.extractor.extract(Content::Image(&pages[0]), strategy),
        };

        let verdict = self.validator.validate(&extraction.record, extraction.confidence);
        let review_reasons = self.review.reasons(&extraction.record, &verdict, extraction.confidence);
        let needs_review = !review_reasons.is_empty();

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "{}: {} fields, confidence {:.0}%, {} in {}ms",
            detection.company,
            extraction.record.populated_count(),
            extraction.confidence,
            if needs_review { "needs review" } else { "ok" },
            processing_time_ms
        );

        Ok(ProcessOutcome {
            source: name,
            source_kind,
            detection,
            strategy: kind,
            record: extraction.record,
            extraction_confidence: extraction.confidence,
            verdict,
            needs_review,
            review_reasons,
            processing_time_ms,
        })
    }

    fn read_pages(&self, pages: &[DynamicImage]) -> Result<String> {
        let acquirer = self.extractor.acquirer().ok_or(InputError::OcrUnavailable)?;
        Ok(acquirer.read_pages(pages)?)
    }

    fn load(&self, source: DocumentSource) -> Result<(SourceKind, Loaded)> {
        let (kind, loaded) = match source {
            DocumentSource::Path(path) => {
                let kind = SourceKind::from_path(&path)?;
                let data = std::fs::read(&path)?;
                return self.load(DocumentSource::Bytes { data, kind });
            }
            DocumentSource::Text(text) => (SourceKind::Text, Loaded::Text(text)),
            DocumentSource::Image(image) => (SourceKind::Image, Loaded::Pages(vec![image])),
            DocumentSource::Bytes { data, kind } => {
                let loaded = match kind {
                    SourceKind::Text => Loaded::Text(String::from_utf8_lossy(&data).into_owned()),
                    SourceKind::Image => {
                        let image = image::load_from_memory(&data)
                            .map_err(|e| InputError::Unreadable(e.to_string()))?;
                        Loaded::Pages(vec![image])
                    }
                    SourceKind::Pdf => self.load_pdf(&data)?,
                };
                (kind, loaded)
            }
        };

        match &loaded {
            Loaded::Text(text) if text.trim().is_empty() => Err(InputError::EmptyDocument.into()),
            Loaded::Pages(pages) if pages.is_empty() => Err(InputError::EmptyDocument.into()),
            Loaded::Pages(_) if !self.has_ocr() => Err(InputError::OcrUnavailable.into()),
            _ => Ok((kind, loaded)),
        }
    }

    /// Embedded text when there is enough of it, page images otherwise.
    fn load_pdf(&self, data: &[u8]) -> Result<Loaded> {
        let pdf = &self.config.pdf;
        let document = PdfDocument::load(data)?;
        debug!("PDF with {} pages", document.page_count());

        let text = if pdf.prefer_embedded_text {
            match document.text() {
                Ok(text) => text,
                Err(e) => {
                    warn!("{}", e);
                    String::new()
                }
            }
        } else {
            String::new()
        };

        let text_len = text.trim().chars().count();
        if text_len >= pdf.min_text_length {
            debug!("Using {} chars of embedded text", text_len);
            return Ok(Loaded::Text(text));
        }

        let pages = if self.has_ocr() {
            self.rasterizer.rasterize(data, pdf.max_pages, pdf.render_dpi)
        } else {
            Err(PdfError::ImageExtraction("no OCR engine configured".to_string()))
        };

        match pages {
            Ok(pages) if !pages.is_empty() => Ok(Loaded::Pages(pages)),
            Ok(_) | Err(_) if text_len > 0 => {
                warn!("No usable page images, falling back to {} chars of embedded text", text_len);
                Ok(Loaded::Text(text))
            }
            Ok(_) => Err(InputError::EmptyDocument.into()),
            Err(PdfError::ImageExtraction(_)) if !self.has_ocr() => Err(InputError::OcrUnavailable.into()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("has_ocr", &self.has_ocr())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolicyscanError;
    use crate::ocr::testing::FakeRecognizer;
    use crate::pdf::testing::image_pdf;
    use image::{GrayImage, Luma};
    use pretty_assertions::assert_eq;

    const ALLSTATE_TEXT: &str = "\
Allstate Vehicle and Property Insurance Company
allstate.com
Renters Policy Declarations
Policy Number: ALS9912345
Named Insured: Dana Whitfield
Property Address: 1200 Lakeshore Drive Unit 5, Chicago, IL 60610
Personal Property: $25,000
Family Liability: $300,000
Deductible: $500
Policy Period: 03/01/2024 to 03/01/2025
Total Premium: $219.00
";

    fn pipeline() -> Pipeline {
        Pipeline::new(PolicyscanConfig::default()).unwrap()
    }

    fn page() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(900, 1100, Luma([255])))
    }

    fn nationwide_scan() -> FakeRecognizer {
        FakeRecognizer::new()
            .answer((200, 60), "Nationwide")
            .answer((150, 20), "52 42 H 123456")
            .answer((60, 20), "$285.24")
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }

    #[test]
    fn test_text_document_uses_company_patterns() {
        let outcome = pipeline()
            .process(DocumentSource::Text(ALLSTATE_TEXT.to_string()), None)
            .unwrap();

        assert_eq!(outcome.detection.company, Company::Allstate);
        assert_eq!(outcome.detection.confidence, 0.75);
        assert_eq!(outcome.strategy, StrategyKind::Pattern);
        assert_eq!(outcome.record.company, Company::Allstate);
        assert_eq!(outcome.record.get(Field::PolicyNumber), "ALS9912345");
        assert_eq!(outcome.record.get(Field::PolicyholderName), "Dana Whitfield");
        assert_eq!(outcome.record.get(Field::LiabilityCoverage), "$300,000");
        assert_eq!(outcome.record.get(Field::EffectiveDate), "03/01/2024");
        assert_eq!(outcome.record.get(Field::ExpirationDate), "03/01/2025");
        assert_eq!(
            outcome.record.get(Field::InsuranceCompany),
            "Allstate Vehicle and Property Insurance Company"
        );
        assert_eq!(outcome.extraction_confidence, 100.0);
        assert!(outcome.verdict.is_valid);
        assert!(!outcome.needs_review);
    }

    #[test]
    fn test_override_skips_detection() {
        let outcome = pipeline()
            .process(DocumentSource::Text(ALLSTATE_TEXT.to_string()), Some(Company::Hanover))
            .unwrap();
        assert_eq!(outcome.detection, DetectionResult::overridden(Company::Hanover));
        assert_eq!(outcome.record.company, Company::Hanover);
    }

    #[test]
    fn test_image_without_recognizer_is_an_input_error() {
        let err = pipeline()
            .process(DocumentSource::Image(page()), None)
            .unwrap_err();
        assert!(matches!(err, PolicyscanError::Input(InputError::OcrUnavailable)));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = pipeline()
            .process(DocumentSource::Path(PathBuf::from("policy.docx")), None)
            .unwrap_err();
        assert!(matches!(err, PolicyscanError::Input(InputError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_empty_text_is_an_input_error() {
        let err = pipeline()
            .process(DocumentSource::Text("  \n".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, PolicyscanError::Input(InputError::EmptyDocument)));
    }

    #[test]
    fn test_undecodable_image_bytes_are_unreadable() {
        let source = DocumentSource::Bytes {
            data: b"not an image".to_vec(),
            kind: SourceKind::Image,
        };
        let err = pipeline().process(source, None).unwrap_err();
        assert!(matches!(err, PolicyscanError::Input(InputError::Unreadable(_))));
    }

    #[test]
    fn test_scanned_image_uses_coordinate_template() {
        let pipeline = pipeline().with_recognizer(Arc::new(nationwide_scan()));
        let outcome = pipeline.process(DocumentSource::Image(page()), None).unwrap();

        assert_eq!(outcome.detection.company, Company::Nationwide);
        assert_eq!(outcome.strategy, StrategyKind::Region);
        assert_eq!(outcome.source_kind, SourceKind::Image);
        assert_eq!(outcome.record.get(Field::PolicyNumber), "52 42 H 123456");
        assert_eq!(outcome.record.get(Field::PremiumAmount), "$285.24");
        assert_eq!(outcome.record.get(Field::InsuranceCompany), "Nationwide");
        assert!(outcome.needs_review);
    }

    #[test]
    fn test_image_pdf_is_rasterized() {
        let mut config = PolicyscanConfig::default();
        config.pdf.prefer_embedded_text = false;
        let pipeline = Pipeline::new(config)
            .unwrap()
            .with_recognizer(Arc::new(nationwide_scan()));

        let data = image_pdf(&[(900, 1100)]);
        let outcome = pipeline
            .process(DocumentSource::Bytes { data, kind: SourceKind::Pdf }, None)
            .unwrap();
        assert_eq!(outcome.source_kind, SourceKind::Pdf);
        assert_eq!(outcome.detection.company, Company::Nationwide);
        assert_eq!(outcome.record.get(Field::PremiumAmount), "$285.24");
    }

    #[test]
    fn test_text_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allstate.txt");
        std::fs::write(&path, ALLSTATE_TEXT).unwrap();

        let outcome = pipeline().process(DocumentSource::Path(path), None).unwrap();
        assert_eq!(outcome.source.as_deref(), Some("allstate.txt"));
        assert_eq!(outcome.source_kind, SourceKind::Text);
        assert_eq!(outcome.detection.company, Company::Allstate);
    }

    #[test]
    fn test_coordinate_mode_on_text_yields_empty_record() {
        let mut config = PolicyscanConfig::default();
        config.extraction.mode = ExtractionMode::Coordinates;
        let outcome = Pipeline::new(config)
            .unwrap()
            .process(DocumentSource::Text(ALLSTATE_TEXT.to_string()), None)
            .unwrap();

        assert_eq!(outcome.strategy, StrategyKind::Region);
        assert_eq!(outcome.record.populated_count(), 0);
        assert!(outcome.verdict.is_valid);
        assert!(outcome.needs_review);
    }

    #[test]
    fn test_correction_resets_review_flag() {
        let pipeline = pipeline();
        let text = ALLSTATE_TEXT.replace("ALS9912345", "A1");
        let mut outcome = pipeline.process(DocumentSource::Text(text), None).unwrap();
        assert!(!outcome.verdict.is_valid);
        assert!(outcome.needs_review);

        outcome.apply_correction(Field::PolicyNumber, "ALS9912345", pipeline.validator());
        assert!(outcome.verdict.is_valid);
        assert!(!outcome.needs_review);
        assert_eq!(outcome.record.get(Field::PolicyNumber), "ALS9912345");
    }

    #[test]
    fn test_strategy_file_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strategies.json");
        std::fs::write(
            &path,
            r#"{"patterns": {"allstate": {"policy_number": ["Policy\\s*Number\\s*:\\s*ALS(\\d+)"]}}}"#,
        )
        .unwrap();

        let mut config = PolicyscanConfig::default();
        config.extraction.strategy_file = Some(path);
        let outcome = Pipeline::new(config)
            .unwrap()
            .process(DocumentSource::Text(ALLSTATE_TEXT.to_string()), None)
            .unwrap();
        assert_eq!(outcome.record.get(Field::PolicyNumber), "9912345");
    }

    #[test]
    fn test_bad_strategy_file_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strategies.json");
        std::fs::write(&path, r#"{"patterns": {"acme": {}}}"#).unwrap();

        let mut config = PolicyscanConfig::default();
        config.extraction.strategy_file = Some(path);
        assert!(matches!(
            Pipeline::new(config),
            Err(PolicyscanError::Strategy(_))
        ));
    }

    #[test]
    fn test_source_kind_from_extension() {
        assert_eq!(SourceKind::from_extension("PDF"), Some(SourceKind::Pdf));
        assert_eq!(SourceKind::from_extension("tif"), Some(SourceKind::Image));
        assert_eq!(SourceKind::from_extension("txt"), Some(SourceKind::Text));
        assert_eq!(SourceKind::from_extension("docx"), None);
    }
}
