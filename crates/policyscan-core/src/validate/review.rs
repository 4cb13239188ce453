//! Human-review routing.

use tracing::debug;

use super::ValidationVerdict;
use crate::models::config::ReviewConfig;
use crate::models::record::{ExtractedRecord, Field};

/// Fields whose absence makes a record hard to use at all.
pub const CRITICAL_FIELDS: [Field; 3] = [
    Field::PolicyNumber,
    Field::PolicyholderName,
    Field::CoverageAmount,
];

#[derive(Debug, Clone, Default)]
pub struct ReviewPolicy {
    config: ReviewConfig,
}

impl ReviewPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ReviewConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn should_flag_for_review(
        &self,
        record: &ExtractedRecord,
        verdict: &ValidationVerdict,
        confidence: f32,
    ) -> bool {
        let reasons = self.reasons(record, verdict, confidence);
        if !reasons.is_empty() {
            debug!("Flagged for review: {}", reasons.join("; "));
        }
        !reasons.is_empty()
    }

    /// Every rule that routes the record to a reviewer.
    pub fn reasons(
        &self,
        record: &ExtractedRecord,
        verdict: &ValidationVerdict,
        confidence: f32,
    ) -> Vec<String> {
        let mut reasons = Vec::new();

        if !verdict.is_valid {
            reasons.push(format!("{} validation errors", verdict.errors.len()));
        }
        if confidence < self.config.min_confidence {
            reasons.push(format!("confidence {:.0}% below {:.0}%", confidence, self.config.min_confidence));
        }
        if verdict.warnings.len() >= self.config.max_warnings {
            reasons.push(format!("{} warnings", verdict.warnings.len()));
        }

        let missing = record.missing_of(&CRITICAL_FIELDS);
        if missing.len() >= self.config.max_missing_critical {
            let names: Vec<&str> = missing.iter().map(|f| f.name()).collect();
            reasons.push(format!("missing {}", names.join(", ")));
        }

        reasons
    }
}
