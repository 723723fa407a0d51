use std::collections::HashMap;

use regex::Regex;

use crate::aliases::AliasTable;
use crate::error::CatalogError;

const NUMBER: &str = r"([0-9]+\.?[0-9]*)";

/// One way of locating a value next to a test name. Patterns are built from
/// an already escaped variant and always compiled case-insensitively.
struct Strategy {
    name: &'static str,
    pattern: fn(&str) -> String,
}

fn colon_pattern(variant: &str) -> String {
    format!(r"{variant}\s*:?\s*{NUMBER}")
}

fn whitespace_pattern(variant: &str) -> String {
    format!(r"{variant}\s+{NUMBER}")
}

fn broad_pattern(variant: &str) -> String {
    format!(r"{variant}.*?{NUMBER}")
}

fn separator_pattern(variant: &str) -> String {
    format!(r"{variant}\s*[:\-=]?\s*{NUMBER}")
}

fn word_boundary_pattern(variant: &str) -> String {
    format!(r"\b{variant}\b\s*[:\-=]?\s*{NUMBER}")
}

/// Strictest first; the first strategy that yields a number wins.
const STRATEGIES: [Strategy; 5] = [
    Strategy {
        name: "colon",
        pattern: colon_pattern,
    },
    Strategy {
        name: "whitespace",
        pattern: whitespace_pattern,
    },
    Strategy {
        name: "broad",
        pattern: broad_pattern,
    },
    Strategy {
        name: "separator",
        pattern: separator_pattern,
    },
    Strategy {
        name: "word_boundary",
        pattern: word_boundary_pattern,
    },
];

/// One compiled strategy for one spelling of a test name.
#[derive(Debug, Clone)]
struct Matcher {
    variant: String,
    strategy: &'static str,
    regex: Regex,
}

impl Matcher {
    fn compile(strategy: &Strategy, variant: &str) -> Result<Self, regex::Error> {
        let source = format!("(?i){}", (strategy.pattern)(&regex::escape(variant)));
        Ok(Self {
            variant: variant.to_string(),
            strategy: strategy.name,
            regex: Regex::new(&source)?,
        })
    }

    fn capture(&self, text: &str) -> Option<f64> {
        let value = self
            .regex
            .captures(text)?
            .get(1)?
            .as_str()
            .parse::<f64>()
            .ok()?;
        tracing::debug!(
            variant = %self.variant,
            strategy = self.strategy,
            value,
            "matched lab value"
        );
        Some(value)
    }
}

/// Finds the numeric value reported for a canonical test name in free text.
///
/// Matchers are compiled up front for a fixed set of names, aliases first to
/// last and strategies strictest first within each alias.
#[derive(Debug, Clone, Default)]
pub struct ValueExtractor {
    matchers: HashMap<String, Vec<Matcher>>,
}

impl ValueExtractor {
    pub fn build<'n, I>(aliases: &AliasTable, names: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = &'n str>,
    {
        let mut matchers = HashMap::new();
        for name in names {
            let mut compiled = Vec::new();
            for variant in aliases.aliases_for(name) {
                for strategy in &STRATEGIES {
                    let matcher = Matcher::compile(strategy, variant).map_err(|source| {
                        CatalogError::Pattern {
                            name: name.to_string(),
                            source,
                        }
                    })?;
                    compiled.push(matcher);
                }
            }
            matchers.insert(name.to_string(), compiled);
        }
        Ok(Self { matchers })
    }

    /// `None` means the test does not appear in this text, or was not among
    /// the names the extractor was built for. A leading minus sign is never
    /// consumed, so negative values come back unsigned.
    pub fn extract(&self, text: &str, canonical: &str) -> Option<f64> {
        self.matchers
            .get(canonical)?
            .iter()
            .find_map(|matcher| matcher.capture(text))
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str, name: &str) -> Option<f64> {
        ValueExtractor::build(&AliasTable::builtin(), [name])
            .unwrap()
            .extract(text, name)
    }

    #[test]
    fn reads_colon_separated_value() {
        assert_eq!(extract("Glucose: 150 mg/dL", "Glucose"), Some(150.0));
    }

    #[test]
    fn reads_value_glued_to_name() {
        assert_eq!(extract("Glucose150", "Glucose"), Some(150.0));
    }

    #[test]
    fn reads_decimal_value() {
        assert_eq!(extract("Hemoglobin 13.5 g/dL", "Hemoglobin"), Some(13.5));
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(extract("GLUCOSE 101", "Glucose"), Some(101.0));
        assert_eq!(extract("hba1c: 5.9 %", "HbA1c"), Some(5.9));
    }

    #[test]
    fn every_alias_and_separator_yields_the_same_value() {
        for text in [
            "Glucose: 112",
            "GLU 112",
            "Blood Sugar = 112",
            "blood sugar-112",
            "Fasting glucose (mg/dL) .... 112",
        ] {
            assert_eq!(extract(text, "Glucose"), Some(112.0), "text: {text}");
        }
    }

    #[test]
    fn broad_match_skips_filler_between_name_and_value() {
        assert_eq!(
            extract("ALT (SGPT) serum, result 42 U/L", "ALT"),
            Some(42.0)
        );
    }

    #[test]
    fn earlier_alias_wins_over_later_one() {
        let text = "Hgb 14.1\nHemoglobin 13.0";
        assert_eq!(extract(text, "Hemoglobin"), Some(13.0));
    }

    #[test]
    fn unregistered_name_is_matched_literally() {
        assert_eq!(extract("Zinc: 88 ug/dL", "Zinc"), Some(88.0));
    }

    #[test]
    fn absent_test_returns_none() {
        assert_eq!(extract("Sodium 140 mmol/L", "Ferritin"), None);
    }

    #[test]
    fn name_without_number_returns_none() {
        assert_eq!(extract("Ferritin: pending", "Ferritin"), None);
    }

    #[test]
    fn leading_minus_is_not_consumed() {
        assert_eq!(extract("Zinc: -5", "Zinc"), Some(5.0));
    }

    #[test]
    fn regex_metacharacters_in_alias_are_literal() {
        assert_eq!(extract("25(OH)D 31.4 ng/mL", "Vitamin D"), Some(31.4));
    }

    #[test]
    fn matchers_cover_every_alias_and_strategy() {
        let table = AliasTable::builtin();
        let extractor = ValueExtractor::build(&table, ["Glucose", "Zinc"]).unwrap();
        assert_eq!(extractor.len(), 2);
        assert_eq!(
            extractor.matchers["Glucose"].len(),
            table.aliases_for("Glucose").len() * STRATEGIES.len()
        );
        assert_eq!(extractor.matchers["Zinc"].len(), STRATEGIES.len());
    }

    #[test]
    fn one_extractor_serves_many_documents() {
        let extractor = ValueExtractor::build(&AliasTable::builtin(), ["Glucose"]).unwrap();
        for (text, expected) in [("Glucose: 91", 91.0), ("GLU 104", 104.0), ("glucose 77", 77.0)] {
            assert_eq!(extractor.extract(text, "Glucose"), Some(expected));
        }
    }

    #[test]
    fn names_outside_the_build_set_are_not_matched() {
        let extractor = ValueExtractor::build(&AliasTable::builtin(), ["Glucose"]).unwrap();
        assert_eq!(extractor.extract("Ferritin: 80", "Ferritin"), None);
    }
}
