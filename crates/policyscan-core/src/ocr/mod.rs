//! Text acquisition: OCR over prepared regions and whole pages.
//!
//! Recognition itself is an external capability behind [`TextRecognizer`].
//! This module owns what happens around it: region cropping and cleanup,
//! reading order, and bounded multi-page work.

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;

pub use preprocessing::{RegionPreparator, otsu_threshold};
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::geometry::Rect;

/// Turns an image into raw text.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// A recognized line with its axis-aligned position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// Left, top, right, bottom.
    pub bounds: [f32; 4],
    pub confidence: f32,
}

/// Sort lines top-to-bottom, then left-to-right within a 20px band.
pub fn sort_by_reading_order(lines: &mut [TextLine]) {
    lines.sort_by(|a, b| {
        let row_a = (a.bounds[1] / 20.0) as i32;
        let row_b = (b.bounds[1] / 20.0) as i32;
        row_a.cmp(&row_b).then_with(|| {
            a.bounds[0]
                .partial_cmp(&b.bounds[0])
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });
}

/// Shared OCR front end used by detection, extraction and the pipeline.
#[derive(Clone)]
pub struct TextAcquirer {
    recognizer: Arc<dyn TextRecognizer>,
    preparator: RegionPreparator,
}

impl TextAcquirer {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            preparator: RegionPreparator::new(),
        }
    }

    pub fn with_preparator(mut self, preparator: RegionPreparator) -> Self {
        self.preparator = preparator;
        self
    }

    pub fn preparator(&self) -> &RegionPreparator {
        &self.preparator
    }

    /// Prepare and recognize a single region.
    pub fn read_region(&self, image: &DynamicImage, rect: Rect) -> Result<String, OcrError> {
        let prepared = self.preparator.prepare_region(image, rect)?;
        let text = self.recognizer.recognize(&prepared)?;
        debug!("Region {:?}: {:?}", rect, text);
        Ok(text)
    }

    /// Prepare and recognize a whole page.
    pub fn read_page(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let prepared = self.preparator.prepare_page(image);
        self.recognizer.recognize(&prepared)
    }

    /// Recognize several pages, skipping pages that fail.
    ///
    /// Returns an error only when every page failed.
    pub fn read_pages(&self, pages: &[DynamicImage]) -> Result<String, OcrError> {
        let mut texts = Vec::with_capacity(pages.len());
        let mut last_error = None;

        for (i, page) in pages.iter().enumerate() {
            match self.read_page(page) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    warn!("OCR failed on page {}: {}", i + 1, e);
                    last_error = Some(e);
                }
            }
        }

        match (texts.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            _ => Ok(texts.join("\n\n")),
        }
    }
}

impl std::fmt::Debug for TextAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextAcquirer")
            .field("preparator", &self.preparator)
            .finish_non_exhaustive()
    }
}
