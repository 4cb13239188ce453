//! Field extraction: applies a company strategy to document content.

pub mod cleaners;
mod pattern;
mod region;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::record::ExtractedRecord;
use crate::ocr::TextAcquirer;
use crate::strategy::FieldStrategy;

/// What the extractor works on.
#[derive(Debug, Clone, Copy)]
pub enum Content<'a> {
    Text(&'a str),
    Image(&'a DynamicImage),
}

/// Extracted record with its completeness-based confidence (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub record: ExtractedRecord,
    pub confidence: f32,
}

impl Extraction {
    fn from_record(record: ExtractedRecord) -> Self {
        let confidence = record.completeness();
        Self { record, confidence }
    }
}

/// Runs region or pattern strategies.
///
/// Without a text acquirer only text content can be read; images yield an
/// empty record.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    acquirer: Option<TextAcquirer>,
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_acquirer(mut self, acquirer: TextAcquirer) -> Self {
        self.acquirer = Some(acquirer);
        self
    }

    pub fn acquirer(&self) -> Option<&TextAcquirer> {
        self.acquirer.as_ref()
    }

    /// Extract every canonical field. Never fails: unreadable fields hold
    /// the empty marker.
    pub fn extract(&self, content: Content<'_>, strategy: &FieldStrategy) -> Extraction {
        let company = strategy.company();
        debug!("Extracting with {:?} strategy for {}", strategy.kind(), company);

        let record = match (strategy, content) {
            (FieldStrategy::Pattern(s), Content::Text(text)) => pattern::extract_patterns(text, s),
            (FieldStrategy::Pattern(s), Content::Image(image)) => match self.page_text(image) {
                Some(text) => pattern::extract_patterns(&text, s),
                None => ExtractedRecord::new(company),
            },
            (FieldStrategy::Region(s), Content::Image(image)) => match &self.acquirer {
                Some(acquirer) => region::extract_regions(acquirer, image, s),
                None => {
                    warn!("No text recognizer for region extraction, all fields empty");
                    ExtractedRecord::new(company)
                }
            },
            (FieldStrategy::Region(_), Content::Text(_)) => {
                warn!("Region strategy needs an image; text input gives no fields");
                ExtractedRecord::new(company)
            }
        };

        let extraction = Extraction::from_record(record);
        debug!(
            "{}: {}/10 fields, confidence {:.0}%",
            company,
            extraction.record.populated_count(),
            extraction.confidence
        );
        extraction
    }

    fn page_text(&self, image: &DynamicImage) -> Option<String> {
        let Some(acquirer) = &self.acquirer else {
            warn!("No text recognizer for pattern extraction on an image");
            return None;
        };
        match acquirer.read_page(image) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Page OCR failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company::Company;
    use crate::models::record::{Field, FieldKind};
    use crate::ocr::testing::FakeRecognizer;
    use crate::strategy::{RegionStrategy, StrategyRegistry};
    use image::{GrayImage, Luma};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const DECLARATIONS: &str = "\
RENTERS POLICY DECLARATIONS
Insurance Company: Lemonade Insurance Company
Policy Number: LP-8841230
Named Insured: Maria Gonzalez
Property Address: 42 Elm Street Apt 3, Springfield, IL 62704
Personal Property Coverage: $30,000
Personal Liability: $100,000
Deductible: $500
Effective Date: 01/15/2024
Expiration Date: 01/15/2025
Total Premium: $182.40
";

    fn page() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(900, 1100, Luma([255])))
    }

    fn extractor(fake: FakeRecognizer) -> FieldExtractor {
        FieldExtractor::new().with_acquirer(TextAcquirer::new(Arc::new(fake)))
    }

    #[test]
    fn test_generic_patterns_over_text() {
        let registry = StrategyRegistry::text_patterns();
        let extraction = FieldExtractor::new().extract(Content::Text(DECLARATIONS), registry.generic());
        let record = &extraction.record;

        assert_eq!(record.get(Field::PolicyNumber), "LP-8841230");
        assert_eq!(record.get(Field::PolicyholderName), "Maria Gonzalez");
        assert_eq!(
            record.get(Field::PropertyAddress),
            "42 Elm Street Apt 3, Springfield, IL 62704"
        );
        assert_eq!(record.get(Field::CoverageAmount), "$30,000");
        assert_eq!(record.get(Field::LiabilityCoverage), "$100,000");
        assert_eq!(record.get(Field::Deductible), "$500");
        assert_eq!(record.get(Field::EffectiveDate), "01/15/2024");
        assert_eq!(record.get(Field::ExpirationDate), "01/15/2025");
        assert_eq!(record.get(Field::PremiumAmount), "$182.40");
        assert_eq!(record.get(Field::InsuranceCompany), "Lemonade Insurance Company");
        assert_eq!(extraction.confidence, 100.0);
    }

    #[test]
    fn test_no_match_leaves_fields_empty() {
        let registry = StrategyRegistry::text_patterns();
        let extraction = FieldExtractor::new().extract(Content::Text("nothing useful"), registry.generic());
        assert!(extraction.record.iter().all(|(_, v)| v.is_empty()));
        assert_eq!(extraction.confidence, 0.0);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let registry = StrategyRegistry::text_patterns();
        let extractor = FieldExtractor::new();
        let first = serde_json::to_string(&extractor.extract(Content::Text(DECLARATIONS), registry.generic())).unwrap();
        let second = serde_json::to_string(&extractor.extract(Content::Text(DECLARATIONS), registry.generic())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_region_strategy_cleans_each_kind() {
        let strategy = RegionStrategy::new(Company::Travelers)
            .with_region(Field::PolicyNumber, (10, 10, 101, 20))
            .with_region(Field::PolicyholderName, (10, 40, 102, 20))
            .with_region(Field::Deductible, (10, 70, 103, 20))
            .with_region(Field::EffectiveDate, (10, 100, 104, 20))
            .with_region(Field::InsuranceCompany, (10, 130, 105, 20))
            .with_extra("agent_name", FieldKind::Name, (10, 160, 106, 20));
        let fake = FakeRecognizer::new()
            .answer((101, 20), "Policy #: 601-4823B-917\n")
            .answer((102, 20), " JANE  DOE|")
            .answer((103, 20), "$1,OOO")
            .answer((104, 20), "Effective MARCH 3, 2024")
            .answer((105, 20), "Travelers)")
            .answer((106, 20), "Agent: Sam Lee");

        let extraction = extractor(fake).extract(Content::Image(&page()), &strategy.into());
        let record = &extraction.record;
        assert_eq!(record.get(Field::PolicyNumber), "601-4823B-917");
        assert_eq!(record.get(Field::PolicyholderName), "JANE DOE");
        assert_eq!(record.get(Field::Deductible), "$1,000.00");
        assert_eq!(record.get(Field::EffectiveDate), "Mar 3, 2024");
        assert_eq!(record.get(Field::InsuranceCompany), "Travelers");
        assert_eq!(record.extras["agent_name"], "Agent Sam Lee");
        assert_eq!(extraction.confidence, 50.0);
    }

    #[test]
    fn test_undefined_regions_are_empty_without_ocr() {
        let fake = Arc::new(FakeRecognizer::new());
        let extractor = FieldExtractor::new().with_acquirer(TextAcquirer::new(fake.clone()));
        let strategy = RegionStrategy::new(Company::Generic);

        let extraction = extractor.extract(Content::Image(&page()), &strategy.into());
        assert!(extraction.record.iter().all(|(_, v)| v.is_empty()));
        assert_eq!(*fake.calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_failed_region_does_not_abort() {
        let strategy = RegionStrategy::new(Company::Usaa)
            .with_region(Field::PolicyNumber, (0, 0, 120, 20))
            .with_region(Field::PremiumAmount, (0, 50, 121, 20))
            .with_region(Field::PropertyAddress, (2000, 2000, 50, 20));
        let fake = FakeRecognizer::new()
            .fail((120, 20))
            .answer((121, 20), "$285.24");

        let record = extractor(fake).extract(Content::Image(&page()), &strategy.into()).record;
        assert_eq!(record.get(Field::PolicyNumber), "");
        assert_eq!(record.get(Field::PropertyAddress), "");
        assert_eq!(record.get(Field::PremiumAmount), "$285.24");
    }

    #[test]
    fn test_company_label_and_compact_policy_number() {
        let registry = StrategyRegistry::coordinate_templates();
        // State Farm policy number region is 150x22, company region 200x35.
        let fake = FakeRecognizer::new()
            .answer((150, 22), "78-42 HS 027914")
            .answer((200, 35), "garbled logo");

        let record = extractor(fake)
            .extract(Content::Image(&page()), registry.get_strategy(Company::StateFarm))
            .record;
        assert_eq!(record.get(Field::PolicyNumber), "7842HS027914");
        assert_eq!(record.get(Field::InsuranceCompany), "State Farm");
    }

    #[test]
    fn test_region_strategy_on_text_is_empty() {
        let registry = StrategyRegistry::coordinate_templates();
        let extraction = FieldExtractor::new().extract(
            Content::Text(DECLARATIONS),
            registry.get_strategy(Company::Nationwide),
        );
        assert_eq!(extraction.record.company, Company::Nationwide);
        assert_eq!(extraction.record.populated_count(), 0);
    }

    #[test]
    fn test_pattern_strategy_on_image_reads_page_first() {
        let registry = StrategyRegistry::text_patterns();
        let fake = FakeRecognizer::new().answer((900, 1100), DECLARATIONS);

        let record = extractor(fake)
            .extract(Content::Image(&page()), registry.generic())
            .record;
        assert_eq!(record.get(Field::PolicyNumber), "LP-8841230");
        assert_eq!(record.get(Field::PremiumAmount), "$182.40");
    }
}
