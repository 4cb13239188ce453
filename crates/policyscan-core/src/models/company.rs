//! Closed set of supported insurance companies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Insurance company a document was issued by.
///
/// `Generic` is the fallback used whenever identity or confidence is not
/// good enough to justify a company-specific layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Company {
    StateFarm,
    Allstate,
    Progressive,
    Usaa,
    Nationwide,
    Travelers,
    LibertyMutual,
    Farmers,
    Geico,
    AmericanFamily,
    Erie,
    Amica,
    Csaa,
    Chubb,
    Hartford,
    CountryFinancial,
    Lemonade,
    Hanover,
    Generic,
}

impl Company {
    /// Every specific insurer, in declaration order. `Generic` is excluded.
    pub const KNOWN: [Company; 18] = [
        Company::StateFarm,
        Company::Allstate,
        Company::Progressive,
        Company::Usaa,
        Company::Nationwide,
        Company::Travelers,
        Company::LibertyMutual,
        Company::Farmers,
        Company::Geico,
        Company::AmericanFamily,
        Company::Erie,
        Company::Amica,
        Company::Csaa,
        Company::Chubb,
        Company::Hartford,
        Company::CountryFinancial,
        Company::Lemonade,
        Company::Hanover,
    ];

    /// Stable snake_case identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Company::StateFarm => "state_farm",
            Company::Allstate => "allstate",
            Company::Progressive => "progressive",
            Company::Usaa => "usaa",
            Company::Nationwide => "nationwide",
            Company::Travelers => "travelers",
            Company::LibertyMutual => "liberty_mutual",
            Company::Farmers => "farmers",
            Company::Geico => "geico",
            Company::AmericanFamily => "american_family",
            Company::Erie => "erie",
            Company::Amica => "amica",
            Company::Csaa => "csaa",
            Company::Chubb => "chubb",
            Company::Hartford => "hartford",
            Company::CountryFinancial => "country_financial",
            Company::Lemonade => "lemonade",
            Company::Hanover => "hanover",
            Company::Generic => "generic",
        }
    }

    /// Name as printed on documents and in exports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Company::StateFarm => "State Farm",
            Company::Allstate => "Allstate",
            Company::Progressive => "Progressive",
            Company::Usaa => "USAA",
            Company::Nationwide => "Nationwide",
            Company::Travelers => "Travelers",
            Company::LibertyMutual => "Liberty Mutual",
            Company::Farmers => "Farmers Insurance",
            Company::Geico => "GEICO",
            Company::AmericanFamily => "American Family",
            Company::Erie => "Erie Insurance",
            Company::Amica => "Amica Mutual",
            Company::Csaa => "CSAA Insurance Group",
            Company::Chubb => "Chubb",
            Company::Hartford => "The Hartford",
            Company::CountryFinancial => "COUNTRY Financial",
            Company::Lemonade => "Lemonade",
            Company::Hanover => "The Hanover",
            Company::Generic => "Unknown/Generic",
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Company::Generic)
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Company {
    type Err = InputError;

    /// Accepts identifiers as well as loose spellings ("State Farm",
    /// "state-farm").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        if normalized == "generic" {
            return Ok(Company::Generic);
        }
        Company::KNOWN
            .iter()
            .copied()
            .find(|c| c.id() == normalized)
            .ok_or_else(|| InputError::UnknownCompany(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_company_ids() {
        assert_eq!("state_farm".parse::<Company>().unwrap(), Company::StateFarm);
        assert_eq!("Liberty Mutual".parse::<Company>().unwrap(), Company::LibertyMutual);
        assert_eq!("country-financial".parse::<Company>().unwrap(), Company::CountryFinancial);
        assert_eq!("generic".parse::<Company>().unwrap(), Company::Generic);
    }

    #[test]
    fn test_unknown_company_is_input_error() {
        let err = "acme".parse::<Company>().unwrap_err();
        assert!(matches!(err, InputError::UnknownCompany(ref s) if s == "acme"));
    }

    #[test]
    fn test_ids_round_trip_through_serde() {
        for company in Company::KNOWN {
            let json = serde_json::to_string(&company).unwrap();
            assert_eq!(json, format!("\"{}\"", company.id()));
        }
    }
}
