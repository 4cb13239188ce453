//! Insurance company detection from document text or header regions.

mod markers;

pub use markers::{HEADER_REGIONS, KEYWORDS};

use image::DynamicImage;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::company::Company;
use crate::models::config::DetectionConfig;
use crate::models::geometry::Rect;
use crate::ocr::TextAcquirer;

/// Detected company with a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub company: Company,
    pub confidence: f32,
}

impl DetectionResult {
    pub fn generic(confidence: f32) -> Self {
        Self {
            company: Company::Generic,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Result for a company chosen by the caller.
    pub fn overridden(company: Company) -> Self {
        Self {
            company,
            confidence: 1.0,
        }
    }
}

/// Classifies documents into a known company or the generic fallback.
///
/// Stateless apart from its read-only marker tables, so one detector can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct CompanyDetector {
    threshold: f32,
    base_confidence: f32,
    prefix_chars: usize,
    markers: Vec<(Company, Vec<Regex>)>,
    keywords: Vec<(Company, Vec<String>)>,
    header_regions: Vec<Rect>,
}

impl CompanyDetector {
    pub fn new() -> Self {
        Self::from_config(&DetectionConfig::default())
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            threshold: config.threshold,
            base_confidence: config.base_confidence,
            prefix_chars: config.text_prefix_chars,
            markers: markers::MARKER_TABLE.clone(),
            keywords: KEYWORDS
                .iter()
                .map(|(c, k)| (*c, k.iter().map(|s| s.to_string()).collect()))
                .collect(),
            header_regions: HEADER_REGIONS.iter().map(|r| Rect::from(*r)).collect(),
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Replace the marker table used by [`detect_text`](Self::detect_text).
    pub fn with_markers(mut self, markers: Vec<(Company, Vec<Regex>)>) -> Self {
        self.markers = markers;
        self
    }

    /// Text-pattern mode: fraction of each company's markers found in the
    /// leading part of the text.
    pub fn detect_text(&self, text: &str) -> DetectionResult {
        let prefix = prefix(text, self.prefix_chars);

        let scores = self.markers.iter().filter_map(|(company, patterns)| {
            if patterns.is_empty() {
                return None;
            }
            let matched = patterns.iter().filter(|p| p.is_match(prefix)).count();
            let confidence = self.base_confidence * matched as f32 / patterns.len() as f32;
            if matched > 0 {
                debug!("{}: {}/{} markers", company, matched, patterns.len());
            }
            Some((*company, confidence))
        });

        self.decide(best(scores))
    }

    /// Keyword mode over already-acquired text.
    pub fn detect_keywords(&self, text: &str) -> DetectionResult {
        self.decide(self.keyword_score(text))
    }

    /// Region-keyword mode: OCR the header regions and score keyword hits.
    ///
    /// Regions that cannot be read are skipped; if none can be read the
    /// result is generic with zero confidence.
    pub fn detect_regions(&self, image: &DynamicImage, acquirer: &TextAcquirer) -> DetectionResult {
        let mut usable = 0usize;
        let scores: Vec<(Company, f32)> = self
            .header_regions
            .iter()
            .filter_map(|rect| match acquirer.read_region(image, *rect) {
                Ok(text) => {
                    usable += 1;
                    self.keyword_score(&text)
                }
                Err(e) => {
                    warn!("Skipping header region {:?}: {}", rect, e);
                    None
                }
            })
            .collect();

        if usable == 0 {
            warn!("No header region could be read, falling back to generic");
            return DetectionResult::generic(0.0);
        }
        self.decide(best(scores.into_iter()))
    }

    /// Region text length excludes OCR padding at either end.
    fn keyword_score(&self, text: &str) -> Option<(Company, f32)> {
        let text = text.trim().to_lowercase();
        let len = text.chars().count();
        if len == 0 {
            return None;
        }

        let scores = self.keywords.iter().filter_map(|(company, keywords)| {
            keywords
                .iter()
                .filter(|k| text.contains(k.as_str()))
                .map(|k| (2.0 * k.chars().count() as f32 / len as f32).min(1.0))
                .reduce(f32::max)
                .map(|score| (*company, score))
        });
        best(scores)
    }

    fn decide(&self, best: Option<(Company, f32)>) -> DetectionResult {
        let Some((company, confidence)) = best else {
            debug!("No company markers found");
            return DetectionResult::generic(0.0);
        };
        let confidence = confidence.clamp(0.0, 1.0);

        if confidence < self.threshold {
            info!(
                "Best match {} at {:.2} is below threshold {:.2}, using generic",
                company, confidence, self.threshold
            );
            return DetectionResult::generic(confidence);
        }

        info!("Detected {} ({:.2})", company, confidence);
        DetectionResult { company, confidence }
    }
}

impl Default for CompanyDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Highest positive score; equal scores go to the smallest identifier.
fn best(scores: impl Iterator<Item = (Company, f32)>) -> Option<(Company, f32)> {
    scores
        .filter(|(_, s)| *s > 0.0)
        .fold(None, |best, (company, score)| match best {
            Some((b, s)) if s > score || (s == score && b.id() <= company.id()) => Some((b, s)),
            _ => Some((company, score)),
        })
}

fn prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::testing::FakeRecognizer;
    use image::{GrayImage, Luma};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn re(s: &str) -> Regex {
        Regex::new(s).unwrap()
    }

    #[test]
    fn test_all_markers_give_full_confidence() {
        let text = "State Farm Fire and Casualty Company\nstatefarm.com\nLike a good neighbor";
        let result = CompanyDetector::new().detect_text(text);
        assert_eq!(result.company, Company::StateFarm);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_weak_match_falls_back_to_generic() {
        let result = CompanyDetector::new().detect_text("Quote prepared with Allstate rates");
        assert_eq!(result.company, Company::Generic);
        assert_eq!(result.confidence, 0.25);
    }

    #[test]
    fn test_empty_text_is_generic_zero() {
        let detector = CompanyDetector::new();
        assert_eq!(detector.detect_text(""), DetectionResult::generic(0.0));
        assert_eq!(detector.detect_keywords("   "), DetectionResult::generic(0.0));
    }

    #[test]
    fn test_only_prefix_is_scanned() {
        let config = DetectionConfig {
            text_prefix_chars: 20,
            ..DetectionConfig::default()
        };
        let text = format!("{}\nThe Hartford thehartford.com Hartford Fire", "x".repeat(40));
        let result = CompanyDetector::from_config(&config).detect_text(&text);
        assert_eq!(result, DetectionResult::generic(0.0));
    }

    #[test]
    fn test_tie_goes_to_smallest_identifier() {
        for order in [
            vec![(Company::Travelers, vec![re("acme")]), (Company::Allstate, vec![re("acme")])],
            vec![(Company::Allstate, vec![re("acme")]), (Company::Travelers, vec![re("acme")])],
        ] {
            let result = CompanyDetector::new().with_markers(order).detect_text("acme");
            assert_eq!(result.company, Company::Allstate);
        }

        let result = CompanyDetector::new().with_threshold(0.5).detect_keywords("chubb amica");
        assert_eq!(result.company, Company::Amica);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let config = DetectionConfig {
            base_confidence: 3.0,
            ..DetectionConfig::default()
        };
        let result = CompanyDetector::from_config(&config).detect_text("GEICO geico.com");
        assert_eq!(result.company, Company::Geico);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_keyword_score() {
        let detector = CompanyDetector::new();
        let result = detector.detect_keywords("Nationwide");
        assert_eq!(result.company, Company::Nationwide);
        assert_eq!(result.confidence, 1.0);

        // 2 * 8 / 40 = 0.4
        let result = detector.detect_keywords("allstate renters declarations page xxxxx");
        assert_eq!(result.company, Company::Generic);
        assert!((result.confidence - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_keyword_score_ignores_surrounding_whitespace() {
        let detector = CompanyDetector::new();
        let padded = detector.detect_keywords("\n   allstate renters declarations page xxxxx   \n\n");
        let trimmed = detector.detect_keywords("allstate renters declarations page xxxxx");
        assert_eq!(padded, trimmed);
    }

    fn page() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(850, 1100, Luma([255])))
    }

    #[test]
    fn test_detect_regions_skips_failed_region() {
        let fake = FakeRecognizer::new()
            .fail((800, 100))
            .answer((200, 60), "Progressive")
            .answer((400, 150), "Progressive Home Insurance Company of America");
        let acquirer = TextAcquirer::new(Arc::new(fake));
        let result = CompanyDetector::new().detect_regions(&page(), &acquirer);
        assert_eq!(result.company, Company::Progressive);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_detect_regions_all_failed() {
        let fake = FakeRecognizer::new()
            .fail((800, 100))
            .fail((200, 60))
            .fail((400, 150));
        let acquirer = TextAcquirer::new(Arc::new(fake));
        let result = CompanyDetector::new().detect_regions(&page(), &acquirer);
        assert_eq!(result, DetectionResult::generic(0.0));
    }
}
