//! Concept mapper (spec.md §4.7): scores a vehicle's similarity against a
//! qualitative concept ("reliable", "family car", ...) and assembles the
//! explained score surfaced to the client.

use autolot_config::ConceptTable;
use autolot_core::{
    ComparisonType, ConstraintKind, ExplainedScore, ScalarValue, ScoreComponent, SearchConstraint,
    SimilarityScore, Vehicle,
};
use chrono::Utc;
use std::collections::HashMap;

pub struct ConceptMapper {
    concepts: ConceptTable,
}

impl ConceptMapper {
    pub fn new(concepts: ConceptTable) -> Self {
        Self { concepts }
    }

    /// Scores `vehicle` against the named concept, or `None` if the term is
    /// not in the concept table (the Mapper already rejects those terms as
    /// unmappable before search runs).
    pub fn similarity(&self, vehicle: &Vehicle, term: &str) -> Option<SimilarityScore> {
        let concept = self.concepts.get(term)?;

        let mut component_scores = HashMap::new();
        let mut matching_attributes = Vec::new();
        let mut mismatching_attributes = Vec::new();
        let mut weighted_sum = 0.0;

        for attr in &concept.attributes {
            let score = attribute_score(vehicle, &attr.attribute_name, &attr.target_value, attr.comparison_type);
            component_scores.insert(attr.attribute_name.clone(), score);
            weighted_sum += score * attr.weight;
            if score >= 0.5 {
                matching_attributes.push(attr.attribute_name.clone());
            } else {
                mismatching_attributes.push(attr.attribute_name.clone());
            }
        }

        let description = vehicle.description.to_lowercase();
        let positive_hits = concept.positive_indicators.iter().filter(|p| description.contains(p.as_str())).count();
        let negative_hits = concept.negative_indicators.iter().filter(|n| description.contains(n.as_str())).count();
        let description_boost = (0.05 * positive_hits as f64 - 0.10 * negative_hits as f64).clamp(-0.5, 0.5);

        let overall = (weighted_sum + description_boost).clamp(0.0, 1.0);

        Some(SimilarityScore {
            overall,
            component_scores,
            matching_attributes,
            mismatching_attributes,
            description_boost,
        })
    }

    /// Builds the client-facing explanation: exact/range constraint matches
    /// carry a combined weight of 0.4, qualitative concept matches 0.3
    /// (spec.md §4.7).
    pub fn explain(&self, vehicle: &Vehicle, constraints: &[SearchConstraint], concept_terms: &[String]) -> ExplainedScore {
        let mut components = Vec::new();

        let exact_constraints: Vec<&SearchConstraint> =
            constraints.iter().filter(|c| matches!(c.kind, ConstraintKind::Exact | ConstraintKind::Range)).collect();
        if !exact_constraints.is_empty() {
            let per_constraint_weight = 0.4 / exact_constraints.len() as f64;
            for c in &exact_constraints {
                let satisfied = constraint_satisfied(vehicle, c);
                components.push(ScoreComponent {
                    factor: c.field_name.clone(),
                    score: if satisfied { 1.0 } else { 0.0 },
                    weight: per_constraint_weight,
                    reason: format!("{} {:?} filter {}", c.field_name, c.operator, if satisfied { "matched" } else { "did not match" }),
                });
            }
        }

        if !concept_terms.is_empty() {
            let per_term_weight = 0.3 / concept_terms.len() as f64;
            for term in concept_terms {
                let similarity = self.similarity(vehicle, term);
                let score = similarity.as_ref().map(|s| s.overall).unwrap_or(0.0);
                components.push(ScoreComponent {
                    factor: format!("concept:{term}"),
                    score,
                    weight: per_term_weight,
                    reason: format!("similarity to '{term}' concept: {score:.2}"),
                });
            }
        }

        let score = components.iter().map(|c| c.score * c.weight).sum::<f64>().clamp(0.0, 1.0);
        let explanation = components
            .iter()
            .map(|c| c.reason.clone())
            .collect::<Vec<_>>()
            .join("; ");

        ExplainedScore { score, explanation, components }
    }
}

fn attribute_score(vehicle: &Vehicle, attribute: &str, target: &ScalarValue, cmp: ComparisonType) -> f64 {
    match cmp {
        ComparisonType::Less => linear_decay(numeric_value(vehicle, attribute), target.as_number(), false),
        ComparisonType::Greater => linear_decay(numeric_value(vehicle, attribute), target.as_number(), true),
        ComparisonType::LessOrEqual => step(numeric_value(vehicle, attribute), target.as_number(), |v, t| v <= t),
        ComparisonType::GreaterOrEqual => step(numeric_value(vehicle, attribute), target.as_number(), |v, t| v >= t),
        ComparisonType::Equals => equals_score(vehicle, attribute, target),
        ComparisonType::In => in_score(vehicle, attribute, target),
        ComparisonType::Contains => contains_score(vehicle, attribute, target),
        ComparisonType::ContainsAny => target
            .as_text()
            .map(|list| list.split(',').any(|v| collection_contains(vehicle, attribute, v.trim())))
            .map(|found| if found { 1.0 } else { 0.0 })
            .unwrap_or(0.0),
    }
}

/// Linearly interpolates between a floor of 0.2 at the far boundary (actual
/// ≥ 1.3·target, or ≤ 0.7·target) and 1.0 at the near boundary, matching
/// `step`'s own 1.0/0.2 floor (spec.md §4.7).
fn linear_decay(value: Option<f64>, target: Option<f64>, wants_greater: bool) -> f64 {
    let (Some(value), Some(target)) = (value, target) else { return 0.0 };
    let lower = target * 0.7;
    let upper = target * 1.3;
    let fraction = if wants_greater { (value - lower) / (upper - lower) } else { (upper - value) / (upper - lower) };
    (0.2 + 0.8 * fraction).clamp(0.2, 1.0)
}

fn step(value: Option<f64>, target: Option<f64>, holds: impl Fn(f64, f64) -> bool) -> f64 {
    match (value, target) {
        (Some(v), Some(t)) if holds(v, t) => 1.0,
        (Some(_), Some(_)) => 0.2,
        _ => 0.0,
    }
}

fn equals_score(vehicle: &Vehicle, attribute: &str, target: &ScalarValue) -> f64 {
    match target {
        ScalarValue::Bool(expected) => match attribute {
            "serviceHistoryPresent" => {
                if vehicle.service_history_present == *expected {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        },
        ScalarValue::Text(expected) => match text_value(vehicle, attribute) {
            Some(actual) if actual.eq_ignore_ascii_case(expected) => 1.0,
            Some(_) => 0.0,
            None => 0.0,
        },
        ScalarValue::Number(expected) => match numeric_value(vehicle, attribute) {
            Some(actual) if (actual - expected).abs() < f64::EPSILON => 1.0,
            _ => 0.0,
        },
    }
}

fn in_score(vehicle: &Vehicle, attribute: &str, target: &ScalarValue) -> f64 {
    let Some(list) = target.as_text() else { return 0.0 };
    match text_value(vehicle, attribute) {
        Some(actual) => {
            if list.split(',').any(|v| v.trim().eq_ignore_ascii_case(&actual)) {
                1.0
            } else {
                0.0
            }
        }
        None => 0.0,
    }
}

fn contains_score(vehicle: &Vehicle, attribute: &str, target: &ScalarValue) -> f64 {
    let Some(needle) = target.as_text() else { return 0.0 };
    if collection_contains(vehicle, attribute, needle) {
        1.0
    } else {
        0.0
    }
}

fn collection_contains(vehicle: &Vehicle, attribute: &str, needle: &str) -> bool {
    match attribute {
        "features" => vehicle.features.iter().any(|f| f.eq_ignore_ascii_case(needle)),
        "declarations" => vehicle.declarations.iter().any(|d| d.eq_ignore_ascii_case(needle)),
        _ => false,
    }
}

fn numeric_value(vehicle: &Vehicle, attribute: &str) -> Option<f64> {
    match attribute {
        "mileage" => Some(vehicle.mileage as f64),
        "price" => Some(vehicle.price),
        "engineSize" => Some(vehicle.engine_size),
        "numberOfDoors" => vehicle.number_of_doors.map(f64::from),
        "numberOfServices" => Some(vehicle.number_of_services.unwrap_or(0) as f64),
        "motExpiryDays" => vehicle.mot_expiry_date.map(|d| (d - Utc::now()).num_days() as f64),
        _ => None,
    }
}

fn text_value(vehicle: &Vehicle, attribute: &str) -> Option<String> {
    match attribute {
        "fuelType" => Some(vehicle.fuel_type.clone()),
        "bodyType" => Some(vehicle.body_type.clone()),
        "transmissionType" => Some(vehicle.transmission_type.clone()),
        "make" => Some(vehicle.make.clone()),
        "model" => Some(vehicle.model.clone()),
        _ => None,
    }
}

pub(crate) fn constraint_satisfied(vehicle: &Vehicle, constraint: &SearchConstraint) -> bool {
    use autolot_core::{ConstraintValue, Operator};

    match (&constraint.value, constraint.operator) {
        (ConstraintValue::Scalar(ScalarValue::Number(n)), op) => {
            numeric_value(vehicle, &constraint.field_name).is_some_and(|v| match op {
                Operator::Eq => (v - n).abs() < f64::EPSILON,
                Operator::Ne => (v - n).abs() >= f64::EPSILON,
                Operator::Gt => v > *n,
                Operator::Ge => v >= *n,
                Operator::Lt => v < *n,
                Operator::Le => v <= *n,
                _ => false,
            })
        }
        (ConstraintValue::Pair(ScalarValue::Number(lo), ScalarValue::Number(hi)), Operator::Between) => {
            numeric_value(vehicle, &constraint.field_name).is_some_and(|v| v >= *lo && v <= *hi)
        }
        (ConstraintValue::Scalar(ScalarValue::Text(t)), Operator::Eq) => {
            text_value(vehicle, &constraint.field_name).is_some_and(|v| v.eq_ignore_ascii_case(t))
        }
        (ConstraintValue::Scalar(ScalarValue::Text(t)), Operator::Contains) => {
            collection_contains(vehicle, &constraint.field_name, t)
                || text_value(vehicle, &constraint.field_name).is_some_and(|v| v.to_lowercase().contains(&t.to_lowercase()))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_config::ConceptTable;
    use std::collections::BTreeSet;

    fn vehicle() -> Vehicle {
        Vehicle {
            id: "v1".to_string(),
            make: "Toyota".to_string(),
            model: "Corolla".to_string(),
            derivative: "1.8 Hybrid".to_string(),
            price: 18_000.0,
            mileage: 30_000,
            body_type: "Hatchback".to_string(),
            fuel_type: "Hybrid".to_string(),
            transmission_type: "Automatic".to_string(),
            colour: "Blue".to_string(),
            engine_size: 1.8,
            number_of_doors: Some(5),
            registration_date: None,
            mot_expiry_date: Some(Utc::now() + chrono::Duration::days(200)),
            last_service_date: None,
            sale_location: "Leeds".to_string(),
            channel: "web".to_string(),
            features: BTreeSet::new(),
            declarations: BTreeSet::new(),
            service_history_present: true,
            number_of_services: Some(3),
            description: "well maintained one owner car".to_string(),
            embedding: vec![],
        }
    }

    #[test]
    fn reliable_vehicle_scores_highly() {
        let mapper = ConceptMapper::new(ConceptTable::default());
        let score = mapper.similarity(&vehicle(), "reliable").unwrap();
        assert!(score.overall > 0.6, "expected high reliability score, got {}", score.overall);
    }

    #[test]
    fn description_boost_rewards_positive_indicators() {
        let mapper = ConceptMapper::new(ConceptTable::default());
        let score = mapper.similarity(&vehicle(), "reliable").unwrap();
        assert!(score.description_boost > 0.0);
    }

    #[test]
    fn unknown_concept_returns_none() {
        let mapper = ConceptMapper::new(ConceptTable::default());
        assert!(mapper.similarity(&vehicle(), "whimsical").is_none());
    }
}
