//! Plausibility checks over extracted records.
//!
//! Rules are independent: each one looks at its own field and adds an
//! error or a warning. Only error-level rules make a record invalid.

mod review;

pub use review::ReviewPolicy;

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::config::{AmountRange, ValidationConfig};
use crate::models::record::{ExtractedRecord, Field};

lazy_static! {
    static ref POLICY_NUMBER: Regex = Regex::new(r"(?i)^[A-Z0-9-]{5,20}$").unwrap();
    static ref TWO_DIGIT_YEAR: Regex = Regex::new(r"^\d{1,2}[/-]\d{1,2}[/-]\d{2}$").unwrap();
}

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%Y-%m-%d", "%B %d, %Y", "%b %d, %Y"];
const SHORT_DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m-%d-%y"];

/// Fields whose absence is reported by the completeness rule.
pub const REQUIRED_FIELDS: [Field; 4] = [
    Field::PolicyNumber,
    Field::PolicyholderName,
    Field::PropertyAddress,
    Field::CoverageAmount,
];

/// Outcome of one field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldResult {
    pub valid: bool,
    pub message: String,
}

impl FieldResult {
    fn ok() -> Self {
        Self {
            valid: true,
            message: "Valid".to_string(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub field_results: BTreeMap<Field, FieldResult>,

    /// Effective/expiration ordering and term length, when both dates parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<FieldResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Error,
    Warning,
}

impl ValidationVerdict {
    fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            field_results: BTreeMap::new(),
            date_range: None,
        }
    }

    fn record(&mut self, field: Field, result: FieldResult, severity: Severity) {
        if !result.valid {
            self.report(format!("{}: {}", field.label(), result.message), severity);
        }
        self.field_results.insert(field, result);
    }

    fn report(&mut self, message: String, severity: Severity) {
        match severity {
            Severity::Error => {
                self.is_valid = false;
                self.errors.push(message);
            }
            Severity::Warning => self.warnings.push(message),
        }
    }
}

/// Parse a date in any of the accepted formats.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let formats = if TWO_DIGIT_YEAR.is_match(value) {
        SHORT_DATE_FORMATS
    } else {
        DATE_FORMATS
    };
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Record validator with configurable plausibility ranges.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Run every rule. `confidence` is the extraction confidence (0-100).
    pub fn validate(&self, record: &ExtractedRecord, confidence: f32) -> ValidationVerdict {
        let mut verdict = ValidationVerdict::new();
        let present = move |field: Field| (!record.is_missing(field)).then(|| record.get(field));

        if let Some(value) = present(Field::PolicyNumber) {
            verdict.record(Field::PolicyNumber, check_policy_number(value), Severity::Error);
        }
        if let Some(value) = present(Field::PolicyholderName) {
            verdict.record(Field::PolicyholderName, check_name(value), Severity::Warning);
        }
        if let Some(value) = present(Field::PropertyAddress) {
            verdict.record(Field::PropertyAddress, check_address(value), Severity::Warning);
        }

        for (field, range) in [
            (Field::CoverageAmount, self.config.coverage_amount),
            (Field::LiabilityCoverage, self.config.liability_coverage),
            (Field::Deductible, self.config.deductible),
            (Field::PremiumAmount, self.config.premium_amount),
        ] {
            if let Some(value) = present(field) {
                verdict.record(field, check_amount(field, value, range), Severity::Warning);
            }
        }

        for field in [Field::EffectiveDate, Field::ExpirationDate] {
            if let Some(value) = present(field) {
                verdict.record(field, self.check_date(field, value), Severity::Warning);
            }
        }

        let effective = present(Field::EffectiveDate).and_then(parse_date);
        let expiration = present(Field::ExpirationDate).and_then(parse_date);
        if let (Some(effective), Some(expiration)) = (effective, expiration) {
            let result = self.check_term(effective, expiration);
            if !result.valid {
                verdict.report(format!("Date Range: {}", result.message), Severity::Error);
            }
            verdict.date_range = Some(result);
        }

        let missing = record.missing_of(&REQUIRED_FIELDS);
        if !missing.is_empty() {
            let labels: Vec<&str> = missing.iter().map(|f| f.label()).collect();
            verdict.report(
                format!("Missing required fields: {}", labels.join(", ")),
                Severity::Warning,
            );
        }

        if confidence < self.config.low_confidence {
            verdict.report(
                format!("Low extraction confidence: {:.0}%", confidence),
                Severity::Warning,
            );
        }

        info!(
            "Validation complete: {} errors, {} warnings",
            verdict.errors.len(),
            verdict.warnings.len()
        );
        verdict
    }

    fn check_date(&self, field: Field, value: &str) -> FieldResult {
        match parse_date(value) {
            Some(date) if date.year() < self.config.min_year || date.year() > self.config.max_year => {
                FieldResult::invalid(format!("{} year appears incorrect", field.name()))
            }
            Some(_) => FieldResult::ok(),
            None => FieldResult::invalid(format!("{} format is invalid", field.name())),
        }
    }

    fn check_term(&self, effective: NaiveDate, expiration: NaiveDate) -> FieldResult {
        if expiration <= effective {
            return FieldResult::invalid("Expiration date must be after effective date");
        }
        let days = (expiration - effective).num_days();
        if days < self.config.min_term_days || days > self.config.max_term_days {
            return FieldResult::invalid(format!("Policy duration ({} days) seems unusual", days));
        }
        FieldResult::ok()
    }
}

fn check_policy_number(value: &str) -> FieldResult {
    if POLICY_NUMBER.is_match(value.trim()) {
        FieldResult::ok()
    } else {
        FieldResult::invalid("Policy number format appears invalid")
    }
}

fn check_name(value: &str) -> FieldResult {
    if value.split_whitespace().count() < 2 {
        return FieldResult::invalid("Name should include first and last name");
    }
    if value.chars().any(|c| c.is_ascii_digit()) {
        return FieldResult::invalid("Name contains numbers (possible OCR error)");
    }
    FieldResult::ok()
}

fn check_address(value: &str) -> FieldResult {
    if value.trim().chars().count() < 10 {
        FieldResult::invalid("Address appears incomplete")
    } else {
        FieldResult::ok()
    }
}

fn check_amount(field: Field, value: &str, range: AmountRange) -> FieldResult {
    let Some(amount) = parse_number(value) else {
        return FieldResult::invalid(format!("{} is not a valid number", field.name()));
    };
    if range.contains(amount) {
        FieldResult::ok()
    } else {
        FieldResult::invalid(format!(
            "{} outside typical range ({}-{})",
            field.name(),
            short_amount(range.min),
            short_amount(range.max)
        ))
    }
}

/// Strict amount parse: only `$`, thousands separators and outer
/// whitespace are dropped.
fn parse_number(value: &str) -> Option<f64> {
    let digits: String = value.chars().filter(|c| *c != '$' && *c != ',').collect();
    Decimal::from_str(digits.trim()).ok()?.to_f64()
}

/// `$100`, `$10k`, `$1M`.
fn short_amount(value: f64) -> String {
    if value >= 1_000_000.0 && value % 1_000_000.0 == 0.0 {
        format!("${}M", value / 1_000_000.0)
    } else if value >= 1_000.0 && value % 1_000.0 == 0.0 {
        format!("${}k", value / 1_000.0)
    } else {
        format!("${}", value)
    }
}
