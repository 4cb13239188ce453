//! Built-in pattern tables for text-based documents.

use lazy_static::lazy_static;

use super::{PatternStrategy, RegistryBuilder};
use crate::error::StrategyError;
use crate::models::company::Company;
use crate::models::record::Field;

type Table = &'static [(Field, &'static [&'static str])];

// Names keep case sensitivity inside the capture: capitalization is what
// separates a name from the label text around it.
const NAME: &str = r"((?-i:[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)+))";

const GENERIC: Table = &[
    (
        Field::PolicyNumber,
        &[
            r"Policy\s*(?:Number|#|No\.?|ID)\s*:?\s*([A-Z0-9\-]+)",
            r"POL\s*#?\s*:?\s*([A-Z0-9\-]+)",
            r"Contract\s*(?:Number|#)\s*:?\s*([A-Z0-9\-]+)",
        ],
    ),
    (
        Field::PolicyholderName,
        &[
            "(?:Named\\s*)?Insured\\s*:?\\s*{NAME}",
            "Policyholder\\s*(?:Name)?\\s*:?\\s*{NAME}",
            "Name\\s*:?\\s*{NAME}",
            "Customer\\s*Name\\s*:?\\s*{NAME}",
        ],
    ),
    (
        Field::PropertyAddress,
        &[
            r"Property\s*Address\s*:?\s*(.+?)$",
            r"Insured\s*(?:Location|Address)\s*:?\s*(.+?)$",
            r"Location\s*:?\s*(.+?)$",
            r"Address\s*:?\s*(.+?)$",
            r"Premises\s*:?\s*(.+?)$",
        ],
    ),
    (
        Field::CoverageAmount,
        &[
            r"Personal\s*Property\s*(?:Coverage)?\s*:?\s*\$?\s*([\d,]+)",
            r"Contents\s*(?:Coverage)?\s*:?\s*\$?\s*([\d,]+)",
            r"Coverage\s*C\s*:?\s*\$?\s*([\d,]+)",
            r"Personal\s*Belongings\s*:?\s*\$?\s*([\d,]+)",
            r"Renter's\s*Property\s*Coverage\s*:?\s*\$?\s*([\d,]+)",
        ],
    ),
    (
        Field::LiabilityCoverage,
        &[
            r"Personal\s*Liability\s*:?\s*\$?\s*([\d,]+)",
            r"Liability\s*Coverage\s*:?\s*\$?\s*([\d,]+)",
            r"Coverage\s*E\s*:?\s*\$?\s*([\d,]+)",
            r"Family\s*Liability\s*:?\s*\$?\s*([\d,]+)",
        ],
    ),
    (
        Field::Deductible,
        &[
            r"Deductible\s*:?\s*\$?\s*([\d,]+)",
            r"All\s*Perils\s*Deductible\s*:?\s*\$?\s*([\d,]+)",
        ],
    ),
    (
        Field::EffectiveDate,
        &[
            r"Effective\s*Date\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"Policy\s*(?:Start|Begin)\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"Inception\s*Date\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        ],
    ),
    (
        Field::ExpirationDate,
        &[
            r"Expir(?:ation|y)\s*Date\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"Policy\s*(?:End|Expiry)\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"(?:to|through)\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        ],
    ),
    (
        Field::PremiumAmount,
        &[
            r"Total\s*Premium\s*:?\s*\$?\s*([\d,]+\.?\d*)",
            r"Annual\s*Premium\s*:?\s*\$?\s*([\d,]+\.?\d*)",
            r"Premium\s*:?\s*\$?\s*([\d,]+\.?\d*)",
            r"Amount\s*Due\s*:?\s*\$?\s*([\d,]+\.?\d*)",
        ],
    ),
    (
        Field::InsuranceCompany,
        &[
            r"Insurance\s*Company\s*:?\s*([A-Za-z &]+?)\s*$",
            r"Carrier\s*:?\s*([A-Za-z &]+?)\s*$",
            r"Insurer\s*:?\s*([A-Za-z &]+?)\s*$",
        ],
    ),
];

const ALLSTATE: Table = &[
    (
        Field::PolicyNumber,
        &[
            r"Policy\s*(?:Number|#)\s*:?\s*([A-Z0-9\-]+)",
            r"Policy\s*:?\s*([A-Z]{2,3}\d{7,})",
        ],
    ),
    (
        Field::PolicyholderName,
        &[
            "Named\\s*Insured\\s*:?\\s*{NAME}",
            "Policyholder\\s*:?\\s*{NAME}",
        ],
    ),
    (
        Field::PropertyAddress,
        &[
            r"Property\s*Address\s*:?\s*(.+?)$",
            r"Location\s*:?\s*(.+?)$",
        ],
    ),
    (
        Field::CoverageAmount,
        &[
            r"Personal\s*Property\s*:?\s*\$?\s*([\d,]+)",
            r"Contents\s*:?\s*\$?\s*([\d,]+)",
        ],
    ),
    (
        Field::LiabilityCoverage,
        &[
            r"Family\s*Liability\s*:?\s*\$?\s*([\d,]+)",
            r"Personal\s*Liability\s*:?\s*\$?\s*([\d,]+)",
        ],
    ),
    (Field::Deductible, &[r"Deductible\s*:?\s*\$?\s*([\d,]+)"]),
    (
        Field::EffectiveDate,
        &[
            r"Policy\s*Period\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"Effective\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        ],
    ),
    (
        Field::ExpirationDate,
        &[
            r"(?:to|through)\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"Expiration\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        ],
    ),
    (
        Field::PremiumAmount,
        &[r"Total\s*Premium\s*:?\s*\$?\s*([\d,]+\.?\d*)"],
    ),
    (Field::InsuranceCompany, &[r"(Allstate[^\n]*)"]),
];

const HANOVER: Table = &[
    (
        Field::PolicyNumber,
        &[
            r"Policy\s*(?:Number|#)\s*:?\s*([A-Z0-9\-]+)",
            r"Policy\s*:?\s*([A-Z]{2}\d{7,})",
        ],
    ),
    (
        Field::PolicyholderName,
        &[
            "Named\\s*Insured\\s*:?\\s*{NAME}",
            "Insured\\s*:?\\s*{NAME}",
        ],
    ),
    (
        Field::PropertyAddress,
        &[
            r"Property\s*Address\s*:?\s*(.+?)$",
            r"Location\s*:?\s*(.+?)$",
        ],
    ),
    (
        Field::CoverageAmount,
        &[
            r"Personal\s*Property\s*:?\s*\$?\s*([\d,]+)",
            r"Contents\s*:?\s*\$?\s*([\d,]+)",
        ],
    ),
    (
        Field::LiabilityCoverage,
        &[
            r"Personal\s*Liability\s*:?\s*\$?\s*([\d,]+)",
            r"Liability\s*:?\s*\$?\s*([\d,]+)",
        ],
    ),
    (Field::Deductible, &[r"Deductible\s*:?\s*\$?\s*([\d,]+)"]),
    (
        Field::EffectiveDate,
        &[r"Effective\s*Date\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})"],
    ),
    (
        Field::ExpirationDate,
        &[r"Expiration\s*Date\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})"],
    ),
    (
        Field::PremiumAmount,
        &[r"Total\s*Premium\s*:?\s*\$?\s*([\d,]+\.?\d*)"],
    ),
    (
        Field::InsuranceCompany,
        &[r"(The\s*Hanover[^\n]*)", r"(Hanover[^\n]*)"],
    ),
];

fn compile(company: Company, table: Table) -> Result<PatternStrategy, StrategyError> {
    let expanded: Vec<(Field, Vec<String>)> = table
        .iter()
        .map(|(field, sources)| {
            let sources = sources.iter().map(|s| s.replace("{NAME}", NAME)).collect();
            (*field, sources)
        })
        .collect();

    expanded
        .iter()
        .try_fold(PatternStrategy::new(company), |strategy, (field, sources)| {
            strategy.with_patterns(*field, sources.as_slice())
        })
}

lazy_static! {
    static ref GENERIC_PATTERNS: PatternStrategy = compile(Company::Generic, GENERIC).unwrap();
    static ref ALLSTATE_PATTERNS: PatternStrategy = compile(Company::Allstate, ALLSTATE).unwrap();
    static ref HANOVER_PATTERNS: PatternStrategy = compile(Company::Hanover, HANOVER).unwrap();
}

pub(super) fn builder() -> RegistryBuilder {
    RegistryBuilder::default()
        .register(GENERIC_PATTERNS.clone())
        .register(ALLSTATE_PATTERNS.clone())
        .register(HANOVER_PATTERNS.clone())
}
