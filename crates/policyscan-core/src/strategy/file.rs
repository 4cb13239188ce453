//! JSON strategy files extending the built-in tables.
//!
//! ```json
//! {
//!   "regions": {
//!     "erie": {
//!       "label": "Erie Insurance",
//!       "fields": { "policy_number": {"x": 440, "y": 80, "width": 130, "height": 20} },
//!       "extras": { "agent_name": {"kind": "name", "rect": {"x": 100, "y": 330, "width": 200, "height": 20}} }
//!     }
//!   },
//!   "patterns": {
//!     "erie": { "policy_number": ["Policy\\s*#\\s*:?\\s*(Q\\d{8})"] }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{PatternStrategy, Rect, RegionStrategy, RegistryBuilder};
use crate::error::StrategyError;
use crate::models::company::Company;
use crate::models::record::{Field, FieldKind};

/// Additional region templates and pattern tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyFile {
    /// Company id → coordinate template.
    pub regions: BTreeMap<String, RegionTemplate>,

    /// Company id → field name → ordered patterns.
    pub patterns: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// One company's coordinate template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionTemplate {
    /// Reported insurance company name; read from the page when absent.
    pub label: Option<String>,
    pub fields: BTreeMap<String, Rect>,
    pub extras: BTreeMap<String, ExtraTemplate>,
    pub compact_policy_number: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraTemplate {
    #[serde(default = "default_extra_kind")]
    pub kind: FieldKind,
    pub rect: Rect,
}

fn default_extra_kind() -> FieldKind {
    FieldKind::Text
}

impl StrategyFile {
    pub fn from_json(json: &str) -> Result<Self, StrategyError> {
        serde_json::from_str(json).map_err(|e| StrategyError::Decode(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, StrategyError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StrategyError::Decode(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Register every entry, replacing built-ins for the same company.
    ///
    /// Nothing is registered if any entry is invalid.
    pub fn apply(
        &self,
        regions: &mut RegistryBuilder,
        patterns: &mut RegistryBuilder,
    ) -> Result<(), StrategyError> {
        let region_strategies = self
            .regions
            .iter()
            .map(|(id, template)| template.to_strategy(parse_company(id)?))
            .collect::<Result<Vec<_>, _>>()?;

        let pattern_strategies = self
            .patterns
            .iter()
            .map(|(id, table)| {
                table.iter().try_fold(
                    PatternStrategy::new(parse_company(id)?),
                    |strategy, (field, sources)| {
                        strategy.with_patterns(field.parse::<Field>()?, sources.as_slice())
                    },
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Loaded {} region templates and {} pattern tables from strategy file",
            region_strategies.len(),
            pattern_strategies.len()
        );

        for strategy in region_strategies {
            regions.insert(strategy);
        }
        for strategy in pattern_strategies {
            patterns.insert(strategy);
        }
        Ok(())
    }
}

impl RegionTemplate {
    fn to_strategy(&self, company: Company) -> Result<RegionStrategy, StrategyError> {
        let mut strategy = self
            .fields
            .iter()
            .try_fold(RegionStrategy::new(company), |strategy, (name, rect)| {
                Ok::<_, StrategyError>(strategy.with_region(name.parse::<Field>()?, *rect))
            })?;

        for (name, extra) in &self.extras {
            strategy = strategy.with_extra(name.clone(), extra.kind, extra.rect);
        }
        if let Some(label) = &self.label {
            strategy = strategy.with_company_label(label.clone());
        }
        if self.compact_policy_number {
            strategy = strategy.with_compact_policy_number();
        }
        Ok(strategy)
    }
}

fn parse_company(id: &str) -> Result<Company, StrategyError> {
    id.parse::<Company>()
        .map_err(|_| StrategyError::UnknownCompany(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::super::{FieldStrategy, StrategyRegistry, coordinate_builder, pattern_builder};
    use super::*;
    use pretty_assertions::assert_eq;

    const FILE: &str = r#"{
        "regions": {
            "erie": {
                "label": "Erie Insurance",
                "fields": {"policy_number": {"x": 440, "y": 80, "width": 130, "height": 20}},
                "extras": {"agent_name": {"kind": "name", "rect": {"x": 100, "y": 330, "width": 200, "height": 20}}}
            }
        },
        "patterns": {
            "erie": {"policy_number": ["Policy\\s*#\\s*:?\\s*(Q\\d{8})"]}
        }
    }"#;

    #[test]
    fn test_apply_registers_both_tables() {
        let file = StrategyFile::from_json(FILE).unwrap();
        let mut regions = coordinate_builder();
        let mut patterns = pattern_builder();
        file.apply(&mut regions, &mut patterns).unwrap();

        let regions: StrategyRegistry = regions.build().unwrap();
        match regions.get_strategy(Company::Erie) {
            FieldStrategy::Region(s) => {
                assert_eq!(s.rect(Field::PolicyNumber), Some(Rect::new(440, 80, 130, 20)));
                assert_eq!(s.extras()[0].kind, FieldKind::Name);
                assert_eq!(s.company_label(), Some("Erie Insurance"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let patterns = patterns.build().unwrap();
        match patterns.get_strategy(Company::Erie) {
            FieldStrategy::Pattern(s) => assert_eq!(s.patterns(Field::PolicyNumber).len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_company_rejected() {
        let file = StrategyFile::from_json(r#"{"patterns": {"acme": {"deductible": ["x"]}}}"#).unwrap();
        let mut regions = coordinate_builder();
        let mut patterns = pattern_builder();
        let err = file.apply(&mut regions, &mut patterns).unwrap_err();
        assert!(matches!(err, StrategyError::UnknownCompany(ref id) if id == "acme"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let file = StrategyFile::from_json(
            r#"{"regions": {"erie": {"fields": {"agent_name": {"x": 1, "y": 1, "width": 1, "height": 1}}}}}"#,
        )
        .unwrap();
        let mut regions = coordinate_builder();
        let mut patterns = pattern_builder();
        assert!(matches!(
            file.apply(&mut regions, &mut patterns),
            Err(StrategyError::UnknownField(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            StrategyFile::from_json("{not json"),
            Err(StrategyError::Decode(_))
        ));
    }
}
