//! Static company marker tables.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::models::company::Company;

/// Header regions read in region-keyword mode: full top band, logo area,
/// extended top-left block.
pub const HEADER_REGIONS: [(u32, u32, u32, u32); 3] =
    [(0, 0, 800, 100), (100, 20, 200, 60), (0, 0, 400, 150)];

/// Lower-case keywords matched as substrings of OCR'd header text.
pub const KEYWORDS: &[(Company, &[&str])] = &[
    (Company::StateFarm, &["state farm", "statefarm", "state-farm"]),
    (Company::Allstate, &["allstate", "all state"]),
    (Company::Progressive, &["progressive"]),
    (Company::Usaa, &["usaa", "u.s.a.a"]),
    (Company::Nationwide, &["nationwide"]),
    (Company::Travelers, &["travelers", "traveler"]),
    (Company::LibertyMutual, &["liberty mutual", "liberty-mutual", "libertymutual"]),
    (Company::Farmers, &["farmers insurance", "farmers"]),
    (Company::Geico, &["geico", "government employees insurance"]),
    (Company::AmericanFamily, &["american family", "amfam"]),
    (Company::Erie, &["erie insurance", "erie"]),
    (Company::Amica, &["amica mutual", "amica"]),
    (Company::Csaa, &["csaa", "aaa", "triple a"]),
    (Company::Chubb, &["chubb"]),
    (Company::Hartford, &["hartford", "the hartford"]),
    (Company::CountryFinancial, &["country financial", "countryfinancial"]),
    (Company::Lemonade, &["lemonade"]),
    (Company::Hanover, &["hanover", "the hanover"]),
];

/// Name variants, domains and taglines searched in document text.
const MARKERS: &[(Company, &[&str])] = &[
    (
        Company::StateFarm,
        &[r"state\s*farm", r"statefarm\.com", r"like a good neighbor", r"state farm fire and casualty"],
    ),
    (
        Company::Allstate,
        &[r"\ballstate\b", r"allstate\.com", r"you'?re in good hands", r"allstate (?:vehicle and property|fire and casualty|indemnity)"],
    ),
    (
        Company::Progressive,
        &[r"\bprogressive\b", r"progressive\.com", r"progressive (?:casualty|advanced|home)"],
    ),
    (
        Company::Usaa,
        &[r"\busaa\b", r"usaa\.com", r"united services automobile association"],
    ),
    (
        Company::Nationwide,
        &[r"\bnationwide\b", r"nationwide\.com", r"nationwide is on your side", r"nationwide mutual"],
    ),
    (
        Company::Travelers,
        &[r"\btravelers\b", r"travelers\.com", r"travelers (?:casualty|indemnity|home and marine)"],
    ),
    (
        Company::LibertyMutual,
        &[r"liberty\s*mutual", r"libertymutual\.com", r"only pay for what you need"],
    ),
    (
        Company::Farmers,
        &[r"farmers insurance", r"farmers\.com", r"fire insurance exchange"],
    ),
    (
        Company::Geico,
        &[r"\bgeico\b", r"geico\.com", r"government employees insurance"],
    ),
    (
        Company::AmericanFamily,
        &[r"american family", r"amfam\.com", r"\bamfam\b"],
    ),
    (
        Company::Erie,
        &[r"erie insurance", r"erieinsurance\.com", r"erie indemnity"],
    ),
    (
        Company::Amica,
        &[r"\bamica\b", r"amica\.com", r"amica mutual"],
    ),
    (
        Company::Csaa,
        &[r"\bcsaa\b", r"csaa insurance (?:group|exchange)", r"\baaa\b"],
    ),
    (
        Company::Chubb,
        &[r"\bchubb\b", r"chubb\.com", r"federal insurance company"],
    ),
    (
        Company::Hartford,
        &[r"the hartford", r"thehartford\.com", r"hartford (?:fire|casualty|underwriters)"],
    ),
    (
        Company::CountryFinancial,
        &[r"country financial", r"countryfinancial\.com", r"country mutual"],
    ),
    (
        Company::Lemonade,
        &[r"\blemonade\b", r"lemonade\.com", r"lemonade insurance company"],
    ),
    (
        Company::Hanover,
        &[r"the hanover", r"hanover\.com", r"hanover insurance (?:company|group)"],
    ),
];

fn compile(table: &[(Company, &[&str])]) -> Result<Vec<(Company, Vec<Regex>)>, regex::Error> {
    table
        .iter()
        .map(|(company, sources)| {
            let patterns = sources
                .iter()
                .map(|s| RegexBuilder::new(s).case_insensitive(true).build())
                .collect::<Result<Vec<_>, _>>()?;
            Ok((*company, patterns))
        })
        .collect()
}

lazy_static! {
    pub static ref MARKER_TABLE: Vec<(Company, Vec<Regex>)> = compile(MARKERS).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_company_has_markers_and_keywords() {
        for company in Company::KNOWN {
            assert!(MARKER_TABLE.iter().any(|(c, p)| *c == company && !p.is_empty()));
            assert!(KEYWORDS.iter().any(|(c, k)| *c == company && !k.is_empty()));
        }
    }
}
