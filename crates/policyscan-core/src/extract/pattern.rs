//! Regex-table extraction over document text.

use tracing::debug;

use super::cleaners::collapse_whitespace;
use crate::models::record::{ExtractedRecord, Field};
use crate::strategy::PatternStrategy;

pub(super) fn extract_patterns(text: &str, strategy: &PatternStrategy) -> ExtractedRecord {
    let mut record = ExtractedRecord::new(strategy.company());

    for field in Field::ALL {
        if let Some(value) = first_match(text, strategy, field) {
            debug!("{}: {:?}", field, value);
            record.set(field, value);
        }
    }

    record
}

/// First capture of the first pattern that yields a non-blank value.
///
/// Patterns without a group contribute their whole match.
fn first_match(text: &str, strategy: &PatternStrategy, field: Field) -> Option<String> {
    strategy.patterns(field).iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        let m = caps.get(1).or_else(|| caps.get(0))?;
        let value = collapse_whitespace(m.as_str());
        if value.is_empty() {
            return None;
        }

        if field.is_currency() && value.starts_with(|c: char| c.is_ascii_digit()) {
            Some(format!("${}", value))
        } else {
            Some(value)
        }
    })
}
