//! Extracted record model: the canonical field set of an insurance document.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::company::Company;
use crate::error::StrategyError;

/// Marker stored for a field that was not found or not applicable.
pub const EMPTY: &str = "";

/// Check whether a stored value counts as missing.
///
/// Both the empty marker and a lone `-` (used by reviewers and older
/// exports) count as missing.
pub fn is_missing_value(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v == "-"
}

/// Canonical fields extracted from every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    PolicyNumber,
    PolicyholderName,
    PropertyAddress,
    CoverageAmount,
    LiabilityCoverage,
    Deductible,
    EffectiveDate,
    ExpirationDate,
    PremiumAmount,
    InsuranceCompany,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::PolicyNumber,
        Field::PolicyholderName,
        Field::PropertyAddress,
        Field::CoverageAmount,
        Field::LiabilityCoverage,
        Field::Deductible,
        Field::EffectiveDate,
        Field::ExpirationDate,
        Field::PremiumAmount,
        Field::InsuranceCompany,
    ];

    /// snake_case name used in maps, CSV headers and strategy files.
    pub fn name(&self) -> &'static str {
        match self {
            Field::PolicyNumber => "policy_number",
            Field::PolicyholderName => "policyholder_name",
            Field::PropertyAddress => "property_address",
            Field::CoverageAmount => "coverage_amount",
            Field::LiabilityCoverage => "liability_coverage",
            Field::Deductible => "deductible",
            Field::EffectiveDate => "effective_date",
            Field::ExpirationDate => "expiration_date",
            Field::PremiumAmount => "premium_amount",
            Field::InsuranceCompany => "insurance_company",
        }
    }

    /// Human-readable label used in validation messages.
    pub fn label(&self) -> &'static str {
        match self {
            Field::PolicyNumber => "Policy Number",
            Field::PolicyholderName => "Policyholder Name",
            Field::PropertyAddress => "Property Address",
            Field::CoverageAmount => "Coverage Amount",
            Field::LiabilityCoverage => "Liability Coverage",
            Field::Deductible => "Deductible",
            Field::EffectiveDate => "Effective Date",
            Field::ExpirationDate => "Expiration Date",
            Field::PremiumAmount => "Premium Amount",
            Field::InsuranceCompany => "Insurance Company",
        }
    }

    /// Cleaner applied to raw OCR text for this field.
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::PolicyNumber => FieldKind::PolicyNumber,
            Field::PolicyholderName => FieldKind::Name,
            Field::PropertyAddress => FieldKind::Address,
            Field::CoverageAmount
            | Field::LiabilityCoverage
            | Field::Deductible
            | Field::PremiumAmount => FieldKind::Currency,
            Field::EffectiveDate | Field::ExpirationDate => FieldKind::Date,
            Field::InsuranceCompany => FieldKind::Text,
        }
    }

    pub fn is_currency(&self) -> bool {
        self.kind() == FieldKind::Currency
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s.trim())
            .ok_or_else(|| StrategyError::UnknownField(s.to_string()))
    }
}

/// Field type selecting the cleanup applied after text acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text with punctuation noise removed.
    Text,
    /// Alphanumeric identifier.
    PolicyNumber,
    /// Person name.
    Name,
    /// Street/city address.
    Address,
    /// Dollar amount.
    Currency,
    /// Calendar date.
    Date,
}

/// Field map produced by extraction.
///
/// Every canonical field is always present; fields that could not be
/// extracted hold [`EMPTY`]. Maps are ordered so serialization is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Company whose strategy produced the record.
    pub company: Company,

    fields: BTreeMap<Field, String>,

    /// Company-specific values outside the canonical set (agent name, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl ExtractedRecord {
    /// Create a record with every field set to the empty marker.
    pub fn new(company: Company) -> Self {
        Self {
            company,
            fields: Field::ALL
                .iter()
                .map(|f| (*f, EMPTY.to_string()))
                .collect(),
            extras: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or(EMPTY)
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    /// Builder-style setter, handy in tests and fixtures.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn is_missing(&self, field: Field) -> bool {
        is_missing_value(self.get(field))
    }

    /// Iterate over all canonical fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// Number of fields holding a real value.
    pub fn populated_count(&self) -> usize {
        self.fields.values().filter(|v| !is_missing_value(v)).count()
    }

    /// Share of populated canonical fields as a percentage in `[0, 100]`.
    pub fn completeness(&self) -> f32 {
        let total = Field::ALL.len();
        let pct = self.populated_count() as f32 / total as f32 * 100.0;
        pct.clamp(0.0, 100.0)
    }

    /// Which of `fields` are missing, in the order given.
    pub fn missing_of(&self, fields: &[Field]) -> Vec<Field> {
        fields.iter().copied().filter(|f| self.is_missing(*f)).collect()
    }
}
