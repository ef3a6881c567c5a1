//! The qualitative-concept table consumed by the Concept mapper (spec.md
//! §4.7): maps "reliable", "economical", etc. to weighted attribute targets
//! plus description-boost indicators. Overridable at runtime via the
//! `QualitativeTerms` config option (spec.md §6).

use autolot_core::{AttributeWeight, ComparisonType, ScalarValue};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct ConceptDefinition {
    pub attributes: Vec<AttributeWeight>,
    pub positive_indicators: Vec<String>,
    pub negative_indicators: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConceptTable {
    pub concepts: HashMap<String, ConceptDefinition>,
}

fn attr(name: &str, weight: f64, target: ScalarValue, cmp: ComparisonType) -> AttributeWeight {
    AttributeWeight {
        attribute_name: name.to_string(),
        weight,
        target_value: target,
        comparison_type: cmp,
    }
}

fn indicators(words: &[&str]) -> Vec<String> {
    words.iter().map(|s| s.to_string()).collect()
}

impl Default for ConceptTable {
    fn default() -> Self {
        let mut concepts = HashMap::new();

        concepts.insert(
            "reliable".to_string(),
            ConceptDefinition {
                attributes: vec![
                    attr("mileage", 0.3, ScalarValue::Number(60_000.0), ComparisonType::Less),
                    attr(
                        "serviceHistoryPresent",
                        0.3,
                        ScalarValue::Bool(true),
                        ComparisonType::Equals,
                    ),
                    attr("numberOfServices", 0.2, ScalarValue::Number(2.0), ComparisonType::LessOrEqual),
                    attr(
                        "motExpiryDays",
                        0.2,
                        ScalarValue::Number(90.0),
                        ComparisonType::GreaterOrEqual,
                    ),
                ],
                positive_indicators: indicators(&["well maintained", "full service history", "one owner"]),
                negative_indicators: indicators(&["project car", "spares or repairs", "non-runner"]),
            },
        );

        concepts.insert(
            "economical".to_string(),
            ConceptDefinition {
                attributes: vec![
                    attr(
                        "fuelType",
                        0.4,
                        ScalarValue::Text("Electric,Hybrid,Petrol".to_string()),
                        ComparisonType::In,
                    ),
                    attr("engineSize", 0.3, ScalarValue::Number(2.0), ComparisonType::Less),
                    attr("price", 0.3, ScalarValue::Number(20_000.0), ComparisonType::Less),
                ],
                positive_indicators: indicators(&["low running costs", "cheap to run", "great mpg"]),
                negative_indicators: indicators(&["thirsty", "high fuel consumption"]),
            },
        );

        concepts.insert(
            "family car".to_string(),
            ConceptDefinition {
                attributes: vec![
                    attr("numberOfDoors", 0.4, ScalarValue::Number(5.0), ComparisonType::GreaterOrEqual),
                    attr(
                        "bodyType",
                        0.4,
                        ScalarValue::Text("SUV,Estate,MPV".to_string()),
                        ComparisonType::In,
                    ),
                    attr("price", 0.2, ScalarValue::Number(30_000.0), ComparisonType::Less),
                ],
                positive_indicators: indicators(&["spacious", "isofix", "boot space"]),
                negative_indicators: indicators(&["two seater", "impractical"]),
            },
        );

        concepts.insert(
            "sporty".to_string(),
            ConceptDefinition {
                attributes: vec![
                    attr("engineSize", 0.5, ScalarValue::Number(2.0), ComparisonType::Greater),
                    attr(
                        "bodyType",
                        0.3,
                        ScalarValue::Text("Coupe,Convertible".to_string()),
                        ComparisonType::In,
                    ),
                    attr(
                        "transmissionType",
                        0.2,
                        ScalarValue::Text("Manual".to_string()),
                        ComparisonType::Equals,
                    ),
                ],
                positive_indicators: indicators(&["performance", "turbo", "quick"]),
                negative_indicators: indicators(&["economy spec", "base model"]),
            },
        );

        concepts.insert(
            "luxury".to_string(),
            ConceptDefinition {
                attributes: vec![
                    attr("price", 0.5, ScalarValue::Number(40_000.0), ComparisonType::Greater),
                    attr(
                        "features",
                        0.3,
                        ScalarValue::Text("Leather Seats".to_string()),
                        ComparisonType::Contains,
                    ),
                    attr(
                        "features",
                        0.2,
                        ScalarValue::Text("Navigation".to_string()),
                        ComparisonType::Contains,
                    ),
                ],
                positive_indicators: indicators(&["premium", "top spec", "fully loaded"]),
                negative_indicators: indicators(&["basic trim", "no frills"]),
            },
        );

        concepts.insert(
            "practical".to_string(),
            ConceptDefinition {
                attributes: vec![
                    attr(
                        "bodyType",
                        0.5,
                        ScalarValue::Text("Hatchback,Estate,SUV".to_string()),
                        ComparisonType::In,
                    ),
                    attr("price", 0.3, ScalarValue::Number(25_000.0), ComparisonType::Less),
                    attr("mileage", 0.2, ScalarValue::Number(80_000.0), ComparisonType::Less),
                ],
                positive_indicators: indicators(&["versatile", "everyday car"]),
                negative_indicators: indicators(&["impractical", "two door"]),
            },
        );

        Self { concepts }
    }
}

impl ConceptTable {
    pub fn get(&self, term: &str) -> Option<&ConceptDefinition> {
        self.concepts.get(&term.to_lowercase())
    }

    /// Load a table overriding the built-in concepts from an external JSON
    /// file (spec.md §6, `QualitativeTerms`).
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, crate::ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        let concepts: HashMap<String, ConceptDefinition> = serde_json::from_str(&content)
            .map_err(|e| crate::ConfigError::ParseError(e.to_string()))?;
        Ok(Self { concepts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliable_weights_sum_to_one() {
        let table = ConceptTable::default();
        let reliable = table.get("reliable").unwrap();
        let sum: f64 = reliable.attributes.iter().map(|a| a.weight).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = ConceptTable::default();
        assert!(table.get("Reliable").is_some());
        assert!(table.get("nonexistent").is_none());
    }
}
