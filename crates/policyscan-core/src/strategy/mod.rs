//! Company-specific extraction strategies and the registry that serves them.

mod file;
mod patterns;
mod templates;

pub use crate::models::geometry::Rect;
pub use file::{ExtraTemplate, RegionTemplate, StrategyFile};

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StrategyError;
use crate::models::company::Company;
use crate::models::record::{Field, FieldKind};

/// Detection confidence below which only the generic strategy is trusted.
pub const DEFAULT_SELECT_THRESHOLD: f32 = 0.70;

/// Which family a strategy belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Region,
    Pattern,
}

/// A company-specific value read from its own region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraRegion {
    pub name: String,
    pub kind: FieldKind,
    pub rect: Rect,
}

/// Field → rectangle table for a fixed document layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionStrategy {
    company: Company,
    regions: Vec<(Field, Option<Rect>)>,
    extras: Vec<ExtraRegion>,
    company_label: Option<String>,
    compact_policy_number: bool,
}

impl RegionStrategy {
    /// A strategy with every field undefined.
    pub fn new(company: Company) -> Self {
        Self {
            company,
            regions: Field::ALL.iter().map(|f| (*f, None)).collect(),
            extras: Vec::new(),
            company_label: None,
            compact_policy_number: false,
        }
    }

    pub fn with_region(mut self, field: Field, rect: impl Into<Rect>) -> Self {
        let rect = rect.into();
        if let Some(slot) = self.regions.iter_mut().find(|(f, _)| *f == field) {
            slot.1 = Some(rect);
        }
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, kind: FieldKind, rect: impl Into<Rect>) -> Self {
        self.extras.push(ExtraRegion {
            name: name.into(),
            kind,
            rect: rect.into(),
        });
        self
    }

    /// Report this name as the insurance company instead of reading it.
    pub fn with_company_label(mut self, label: impl Into<String>) -> Self {
        self.company_label = Some(label.into());
        self
    }

    /// Remove spaces and hyphens from extracted policy numbers.
    pub fn with_compact_policy_number(mut self) -> Self {
        self.compact_policy_number = true;
        self
    }

    pub fn company(&self) -> Company {
        self.company
    }

    pub fn rect(&self, field: Field) -> Option<Rect> {
        self.regions
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, r)| *r)
    }

    /// Every canonical field with its rectangle, in canonical order.
    pub fn regions(&self) -> impl Iterator<Item = (Field, Option<Rect>)> + '_ {
        self.regions.iter().copied()
    }

    pub fn extras(&self) -> &[ExtraRegion] {
        &self.extras
    }

    pub fn company_label(&self) -> Option<&str> {
        self.company_label.as_deref()
    }

    pub fn compact_policy_number(&self) -> bool {
        self.compact_policy_number
    }
}

/// Field → ordered regex list; the first match wins.
#[derive(Debug, Clone)]
pub struct PatternStrategy {
    company: Company,
    patterns: Vec<(Field, Vec<Regex>)>,
}

impl PatternStrategy {
    pub fn new(company: Company) -> Self {
        Self {
            company,
            patterns: Vec::new(),
        }
    }

    /// Compile a pattern table.
    pub fn compile<S: AsRef<str>>(
        company: Company,
        table: &[(Field, &[S])],
    ) -> Result<Self, StrategyError> {
        table
            .iter()
            .try_fold(Self::new(company), |strategy, (field, sources)| {
                strategy.with_patterns(*field, *sources)
            })
    }

    /// Append patterns for a field, after any already registered.
    ///
    /// Patterns are case-insensitive and multi-line (`$` ends a line).
    pub fn with_patterns<S: AsRef<str>>(
        mut self,
        field: Field,
        sources: &[S],
    ) -> Result<Self, StrategyError> {
        let compiled = sources
            .iter()
            .map(|s| compile_pattern(field, s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        match self.patterns.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => existing.extend(compiled),
            None => self.patterns.push((field, compiled)),
        }
        Ok(self)
    }

    pub fn company(&self) -> Company {
        self.company
    }

    pub fn patterns(&self, field: Field) -> &[Regex] {
        self.patterns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, p)| p.as_slice())
            .unwrap_or(&[])
    }

    /// Fields with at least one pattern, in registration order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.patterns.iter().map(|(f, _)| *f)
    }
}

fn compile_pattern(field: Field, source: &str) -> Result<Regex, StrategyError> {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|e| StrategyError::Pattern {
            field: field.name().to_string(),
            reason: e.to_string(),
        })
}

/// The rule set used to pull fields out of one company's documents.
#[derive(Debug, Clone)]
pub enum FieldStrategy {
    Region(RegionStrategy),
    Pattern(PatternStrategy),
}

impl FieldStrategy {
    pub fn company(&self) -> Company {
        match self {
            FieldStrategy::Region(s) => s.company(),
            FieldStrategy::Pattern(s) => s.company(),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            FieldStrategy::Region(_) => StrategyKind::Region,
            FieldStrategy::Pattern(_) => StrategyKind::Pattern,
        }
    }
}

impl From<RegionStrategy> for FieldStrategy {
    fn from(s: RegionStrategy) -> Self {
        FieldStrategy::Region(s)
    }
}

impl From<PatternStrategy> for FieldStrategy {
    fn from(s: PatternStrategy) -> Self {
        FieldStrategy::Pattern(s)
    }
}

/// Immutable company → strategy table with a guaranteed generic entry.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    generic: FieldStrategy,
    strategies: HashMap<Company, FieldStrategy>,
    threshold: f32,
}

impl StrategyRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The built-in coordinate templates.
    pub fn coordinate_templates() -> Self {
        templates::builder().into_registry()
    }

    /// The built-in text pattern tables.
    pub fn text_patterns() -> Self {
        patterns::builder().into_registry()
    }

    /// Strategy registered for `company`, or the generic one.
    pub fn get_strategy(&self, company: Company) -> &FieldStrategy {
        self.strategies.get(&company).unwrap_or(&self.generic)
    }

    /// Like [`get_strategy`](Self::get_strategy), but only trusts a
    /// company-specific strategy when detection was confident enough.
    pub fn select(&self, company: Company, confidence: f32) -> &FieldStrategy {
        if confidence < self.threshold {
            debug!(
                "Confidence {:.2} below {:.2}, using generic strategy instead of {}",
                confidence, self.threshold, company
            );
            return &self.generic;
        }
        self.get_strategy(company)
    }

    pub fn generic(&self) -> &FieldStrategy {
        &self.generic
    }

    /// Companies with their own strategy, sorted by identifier.
    pub fn companies(&self) -> Vec<Company> {
        let mut companies: Vec<Company> = self.strategies.keys().copied().collect();
        companies.sort_by_key(|c| c.id());
        companies
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

/// Collects strategies before the registry is frozen.
///
/// A later registration for the same company replaces the earlier one.
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    strategies: HashMap<Company, FieldStrategy>,
    threshold: f32,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            strategies: HashMap::new(),
            threshold: DEFAULT_SELECT_THRESHOLD,
        }
    }
}

impl RegistryBuilder {
    pub fn register(mut self, strategy: impl Into<FieldStrategy>) -> Self {
        self.insert(strategy);
        self
    }

    pub fn insert(&mut self, strategy: impl Into<FieldStrategy>) {
        let strategy = strategy.into();
        self.strategies.insert(strategy.company(), strategy);
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Freeze the table. Fails if no generic strategy was registered.
    pub fn build(mut self) -> Result<StrategyRegistry, StrategyError> {
        let generic = self
            .strategies
            .remove(&Company::Generic)
            .ok_or(StrategyError::MissingGeneric)?;
        Ok(StrategyRegistry {
            generic,
            strategies: self.strategies,
            threshold: self.threshold,
        })
    }

    /// Freeze a built-in table, which always carries a generic entry.
    fn into_registry(self) -> StrategyRegistry {
        let mut strategies = self.strategies;
        let generic = strategies
            .remove(&Company::Generic)
            .unwrap_or_else(|| RegionStrategy::new(Company::Generic).into());
        StrategyRegistry {
            generic,
            strategies,
            threshold: self.threshold,
        }
    }
}

/// Built-in builders, for extending before freezing.
pub fn coordinate_builder() -> RegistryBuilder {
    templates::builder()
}

pub fn pattern_builder() -> RegistryBuilder {
    patterns::builder()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> StrategyRegistry {
        StrategyRegistry::builder()
            .register(RegionStrategy::new(Company::Generic).with_region(Field::PolicyNumber, (1, 1, 10, 10)))
            .register(RegionStrategy::new(Company::Allstate).with_region(Field::PolicyNumber, (5, 5, 10, 10)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_requires_generic() {
        let err = StrategyRegistry::builder()
            .register(RegionStrategy::new(Company::Allstate))
            .build()
            .unwrap_err();
        assert!(matches!(err, StrategyError::MissingGeneric));
    }

    #[test]
    fn test_unregistered_company_gets_generic() {
        let registry = registry();
        assert_eq!(registry.get_strategy(Company::Lemonade).company(), Company::Generic);
        assert_eq!(registry.get_strategy(Company::Allstate).company(), Company::Allstate);
    }

    #[test]
    fn test_select_demotes_below_threshold() {
        let registry = registry();
        for c in [0.0, 0.3, 0.69, 0.6999] {
            assert_eq!(registry.select(Company::Allstate, c).company(), Company::Generic);
        }
        for c in [0.70, 0.85, 1.0] {
            assert_eq!(registry.select(Company::Allstate, c).company(), Company::Allstate);
        }
    }

    #[test]
    fn test_select_every_builtin_company() {
        let registry = StrategyRegistry::coordinate_templates();
        for company in registry.companies() {
            assert_eq!(registry.select(company, 0.5).company(), Company::Generic);
            assert_eq!(registry.select(company, 0.9).company(), company);
        }
    }

    #[test]
    fn test_later_registration_replaces_earlier() {
        let registry = StrategyRegistry::builder()
            .register(RegionStrategy::new(Company::Generic))
            .register(RegionStrategy::new(Company::Erie).with_region(Field::Deductible, (0, 0, 5, 5)))
            .register(RegionStrategy::new(Company::Erie).with_region(Field::Deductible, (9, 9, 5, 5)))
            .build()
            .unwrap();
        match registry.get_strategy(Company::Erie) {
            FieldStrategy::Region(s) => assert_eq!(s.rect(Field::Deductible), Some(Rect::new(9, 9, 5, 5))),
            other => panic!("unexpected strategy {other:?}"),
        }
    }

    #[test]
    fn test_invalid_pattern_is_reported_with_field() {
        let err = PatternStrategy::new(Company::Generic)
            .with_patterns(Field::Deductible, &["Deductible\\s*(["])
            .unwrap_err();
        assert!(matches!(err, StrategyError::Pattern { ref field, .. } if field == "deductible"));
    }

    #[test]
    fn test_with_patterns_appends_in_order() {
        let strategy = PatternStrategy::new(Company::Generic)
            .with_patterns(Field::Deductible, &["first"])
            .unwrap()
            .with_patterns(Field::Deductible, &["second"])
            .unwrap();
        let sources: Vec<_> = strategy.patterns(Field::Deductible).iter().map(|r| r.as_str()).collect();
        assert_eq!(sources, vec!["first", "second"]);
        assert!(strategy.patterns(Field::PremiumAmount).is_empty());
    }
}
