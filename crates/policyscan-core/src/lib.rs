//! Core library for insurance document field extraction.
//!
//! This crate provides:
//! - Region preparation and text acquisition (OCR behind a trait)
//! - PDF access (embedded text and page images)
//! - Insurance company detection from text or header regions
//! - Company-specific extraction strategies (coordinate regions or patterns)
//! - Field extraction, validation and review flagging
//! - A single-call pipeline tying the stages together

pub mod detect;
pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod strategy;
pub mod validate;

pub use detect::{CompanyDetector, DetectionResult};
pub use error::{InputError, PolicyscanError, Result};
pub use extract::{Content, Extraction, FieldExtractor};
pub use models::company::Company;
pub use models::config::PolicyscanConfig;
pub use models::record::{ExtractedRecord, Field, FieldKind};
pub use ocr::{RegionPreparator, TextAcquirer, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{LopdfRasterizer, PageRasterizer, PdfDocument};
pub use pipeline::{DocumentSource, Pipeline, ProcessOutcome, SourceKind};
pub use strategy::{
    FieldStrategy, PatternStrategy, Rect, RegionStrategy, StrategyFile, StrategyKind, StrategyRegistry,
};
pub use validate::{FieldResult, ReviewPolicy, ValidationVerdict, Validator};
