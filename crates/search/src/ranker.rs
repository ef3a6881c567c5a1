//! Ranker (spec.md §4.8): weighted multi-factor scoring over the raw results
//! returned by an executor, business-rule adjustments, tie-breaking, and
//! make/model diversity.

use autolot_config::{BusinessRuleAdjustments, DiversityConfig, RankerWeights, VocabularyConfig};
use autolot_core::{ComposedQuery, ConstraintKind, Operator, ScalarValue, ScoreBreakdown, SearchConstraint, VehicleResult};
use chrono::Utc;
use std::collections::HashMap;

use crate::concept_mapper::constraint_satisfied;

pub struct Ranker {
    weights: RankerWeights,
    adjustments: BusinessRuleAdjustments,
    diversity: DiversityConfig,
    vocabulary: VocabularyConfig,
}

impl Ranker {
    pub fn new(weights: RankerWeights, adjustments: BusinessRuleAdjustments, diversity: DiversityConfig, vocabulary: VocabularyConfig) -> Self {
        Self { weights: weights.normalized(), adjustments, diversity, vocabulary }
    }

    /// Scores, sorts, and diversifies `results`. Skips diversity processing
    /// when an explicit `make`/`model` Eq constraint is present, since the
    /// caller has already narrowed to one make or model (spec.md §4.8).
    pub fn rank(&self, mut results: Vec<VehicleResult>, composed: &ComposedQuery) -> Vec<VehicleResult> {
        let has_explicit_make_or_model = composed.all_constraints().any(|c| {
            matches!(c.kind, ConstraintKind::Exact)
                && c.operator == Operator::Eq
                && (c.field_name == "make" || c.field_name == "model")
        });

        let exact_range_constraints: Vec<&SearchConstraint> = composed
            .all_constraints()
            .filter(|c| matches!(c.kind, ConstraintKind::Exact | ConstraintKind::Range))
            .collect();

        let cheapest = results.iter().map(|r| r.vehicle.price).fold(f64::INFINITY, f64::min);
        let most_expensive = results.iter().map(|r| r.vehicle.price).fold(f64::NEG_INFINITY, f64::max);

        for result in &mut results {
            let breakdown = self.score_one(result, &exact_range_constraints, cheapest, most_expensive);
            result.breakdown = breakdown;
            result.score = breakdown.final_score.clamp(0.0, 1.0);
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap()
                .then_with(|| a.vehicle.price.partial_cmp(&b.vehicle.price).unwrap())
                .then_with(|| a.vehicle.mileage.cmp(&b.vehicle.mileage))
                .then_with(|| a.vehicle.id.cmp(&b.vehicle.id))
        });

        if has_explicit_make_or_model {
            results
        } else {
            self.diversify(results)
        }
    }

    fn score_one(&self, result: &VehicleResult, exact_range_constraints: &[&SearchConstraint], cheapest: f64, most_expensive: f64) -> ScoreBreakdown {
        let semantic = result.breakdown.semantic;
        let exact_match_score = exact_match_fraction(&result.vehicle, exact_range_constraints);
        let price_competitiveness = price_competitiveness(result.vehicle.price, cheapest, most_expensive);
        let condition = vehicle_condition(&result.vehicle);
        let recency = recency(&result.vehicle);

        let base = self.weights.semantic_relevance * semantic
            + self.weights.exact_match_count * exact_match_score
            + self.weights.price_competitiveness * price_competitiveness
            + self.weights.vehicle_condition * condition
            + self.weights.recency * recency;

        let adjustment = self.business_rule_adjustment(&result.vehicle);

        ScoreBreakdown {
            exact: result.breakdown.exact,
            semantic,
            keyword: result.breakdown.keyword,
            final_score: (base + adjustment).clamp(0.0, 1.0),
        }
    }

    fn business_rule_adjustment(&self, vehicle: &autolot_core::Vehicle) -> f64 {
        let mut adjustment = 0.0;

        if self.vocabulary.is_premium_make(&vehicle.make) {
            adjustment += self.adjustments.premium_make_boost;
        }
        if vehicle.mileage as i64 > self.adjustments.high_mileage_threshold {
            adjustment += self.adjustments.high_mileage_penalty;
        }
        if vehicle.service_history_present {
            adjustment += self.adjustments.full_service_history_boost;
        }
        if vehicle.has_damage_declaration() {
            adjustment += self.adjustments.damage_declaration_penalty;
        }
        if vehicle.fuel_type.eq_ignore_ascii_case("Electric") || vehicle.fuel_type.eq_ignore_ascii_case("Hybrid") {
            adjustment += self.adjustments.electric_hybrid_boost;
        }
        if let Some(mot) = vehicle.mot_expiry_date {
            let days_left = (mot - Utc::now()).num_days();
            if days_left >= 0 && days_left <= self.adjustments.mot_expiring_days {
                adjustment += self.adjustments.mot_expiring_penalty;
            }
        }

        adjustment
    }

    /// Caps the number of results per make and per model, preserving the
    /// existing score order and promoting the next-best result for a
    /// saturated make/model in its place (spec.md §4.8).
    fn diversify(&self, results: Vec<VehicleResult>) -> Vec<VehicleResult> {
        let mut per_make: HashMap<String, usize> = HashMap::new();
        let mut per_model: HashMap<(String, String), usize> = HashMap::new();
        let mut diversified = Vec::with_capacity(results.len());

        for result in results {
            let make_count = per_make.entry(result.vehicle.make.clone()).or_insert(0);
            let model_count = per_model.entry((result.vehicle.make.clone(), result.vehicle.model.clone())).or_insert(0);

            if *make_count >= self.diversity.max_per_make || *model_count >= self.diversity.max_per_model {
                continue;
            }

            *make_count += 1;
            *model_count += 1;
            diversified.push(result);
        }

        diversified
    }
}

/// Fraction of the query's Exact/Range constraints this vehicle actually
/// satisfies, reusing the same per-constraint check `/search/explain` uses
/// (spec.md §4.8, §9). `0.5` neutral default when the query carries none.
fn exact_match_fraction(vehicle: &autolot_core::Vehicle, constraints: &[&SearchConstraint]) -> f64 {
    if constraints.is_empty() {
        return 0.5;
    }
    let satisfied = constraints.iter().filter(|c| constraint_satisfied(vehicle, c)).count();
    satisfied as f64 / constraints.len() as f64
}

fn price_competitiveness(price: f64, cheapest: f64, most_expensive: f64) -> f64 {
    if !cheapest.is_finite() || !most_expensive.is_finite() || (most_expensive - cheapest).abs() < f64::EPSILON {
        return 1.0;
    }
    1.0 - (price - cheapest) / (most_expensive - cheapest)
}

/// Weighted composite of five condition signals, capped at 1.0 (spec.md
/// §4.8): service history +0.3, mileage <50k +0.2/<80k +0.1, MOT expiry
/// >90d +0.2/>30d +0.1, service count >=5 +0.2/>=3 +0.1, no damage
/// declaration +0.1.
fn vehicle_condition(vehicle: &autolot_core::Vehicle) -> f64 {
    let mut score = 0.0;

    if vehicle.service_history_present {
        score += 0.3;
    }

    if vehicle.mileage < 50_000 {
        score += 0.2;
    } else if vehicle.mileage < 80_000 {
        score += 0.1;
    }

    if let Some(mot) = vehicle.mot_expiry_date {
        let days_left = (mot - Utc::now()).num_days();
        if days_left > 90 {
            score += 0.2;
        } else if days_left > 30 {
            score += 0.1;
        }
    }

    match vehicle.number_of_services {
        Some(n) if n >= 5 => score += 0.2,
        Some(n) if n >= 3 => score += 0.1,
        _ => {}
    }

    if !vehicle.has_damage_declaration() {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}

/// Discrete age bands rather than continuous decay (spec.md §4.8): <=1y 1.0,
/// <=3y 0.8, <=5y 0.6, <=10y 0.4, else 0.2; 0.5 when registration is unknown.
fn recency(vehicle: &autolot_core::Vehicle) -> f64 {
    let Some(registration) = vehicle.registration_date else { return 0.5 };
    let age_years = (Utc::now() - registration).num_days() as f64 / 365.25;
    if age_years <= 1.0 {
        1.0
    } else if age_years <= 3.0 {
        0.8
    } else if age_years <= 5.0 {
        0.6
    } else if age_years <= 10.0 {
        0.4
    } else {
        0.2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_core::{ComposedQuery, LogicalOp, QueryType, ScoreBreakdown, Vehicle, VehicleResult};
    use std::collections::BTreeSet;

    fn vehicle(id: &str, make: &str, model: &str, price: f64, mileage: i64) -> Vehicle {
        Vehicle {
            id: id.to_string(),
            make: make.to_string(),
            model: model.to_string(),
            derivative: "base".to_string(),
            price,
            mileage,
            body_type: "Hatchback".to_string(),
            fuel_type: "Petrol".to_string(),
            transmission_type: "Manual".to_string(),
            colour: "Blue".to_string(),
            engine_size: 1.6,
            number_of_doors: Some(5),
            registration_date: Some(Utc::now() - chrono::Duration::days(365)),
            mot_expiry_date: Some(Utc::now() + chrono::Duration::days(200)),
            last_service_date: None,
            sale_location: "Leeds".to_string(),
            channel: "web".to_string(),
            features: BTreeSet::new(),
            declarations: BTreeSet::new(),
            service_history_present: true,
            number_of_services: Some(2),
            description: "tidy example".to_string(),
            embedding: vec![],
        }
    }

    fn empty_composed() -> ComposedQuery {
        ComposedQuery {
            groups: vec![],
            inter_group_op: LogicalOp::And,
            warnings: vec![],
            has_conflicts: false,
            filter_expression: String::new(),
            query_type: QueryType::Simple,
        }
    }

    fn ranker() -> Ranker {
        Ranker::new(
            RankerWeights::default(),
            BusinessRuleAdjustments::default(),
            DiversityConfig::default(),
            VocabularyConfig::default(),
        )
    }

    #[test]
    fn cheaper_vehicle_scores_higher_on_price_competitiveness() {
        let results = vec![
            VehicleResult::new(vehicle("a", "Ford", "Focus", 25_000.0, 20_000), ScoreBreakdown::default()),
            VehicleResult::new(vehicle("b", "Ford", "Focus", 10_000.0, 20_000), ScoreBreakdown::default()),
        ];
        let ranked = ranker().rank(results, &empty_composed());
        assert_eq!(ranked[0].vehicle.id, "b");
    }

    #[test]
    fn premium_make_receives_a_boost() {
        let results = vec![
            VehicleResult::new(vehicle("a", "Dacia", "Sandero", 15_000.0, 20_000), ScoreBreakdown::default()),
            VehicleResult::new(vehicle("b", "BMW", "320d", 15_000.0, 20_000), ScoreBreakdown::default()),
        ];
        let ranked = ranker().rank(results, &empty_composed());
        assert_eq!(ranked[0].vehicle.id, "b");
    }

    #[test]
    fn diversity_cap_limits_results_per_make() {
        let mut results = Vec::new();
        for i in 0..5 {
            results.push(VehicleResult::new(
                vehicle(&format!("v{i}"), "BMW", "320d", 15_000.0 + i as f64, 20_000),
                ScoreBreakdown::default(),
            ));
        }
        let ranked = ranker().rank(results, &empty_composed());
        assert!(ranked.len() <= DiversityConfig::default().max_per_make);
    }

    #[test]
    fn explicit_make_filter_skips_diversity_cap() {
        let mut results = Vec::new();
        for i in 0..5 {
            results.push(VehicleResult::new(
                vehicle(&format!("v{i}"), "BMW", "320d", 15_000.0 + i as f64, 20_000),
                ScoreBreakdown::default(),
            ));
        }
        let composed = ComposedQuery {
            groups: vec![autolot_core::ConstraintGroup {
                constraints: vec![autolot_core::SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("BMW".to_string()))],
                op: LogicalOp::And,
                priority: 1.0,
            }],
            ..empty_composed()
        };
        let ranked = ranker().rank(results, &composed);
        assert_eq!(ranked.len(), 5);
    }

    #[test]
    fn exact_match_fraction_is_neutral_with_no_constraints() {
        let v = vehicle("a", "Ford", "Focus", 15_000.0, 20_000);
        assert_eq!(exact_match_fraction(&v, &[]), 0.5);
    }

    #[test]
    fn exact_match_fraction_reflects_partial_satisfaction() {
        let v = vehicle("a", "Ford", "Focus", 15_000.0, 20_000);
        let make_match = autolot_core::SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("Ford".to_string()));
        let price_miss = autolot_core::SearchConstraint::range("price", Operator::Le, autolot_core::ConstraintValue::Scalar(ScalarValue::Number(1_000.0)));
        let constraints = [&make_match, &price_miss];
        assert_eq!(exact_match_fraction(&v, &constraints), 0.5);
    }

    #[test]
    fn vehicle_condition_rewards_low_mileage_and_service_history() {
        let mut v = vehicle("a", "Ford", "Focus", 15_000.0, 10_000);
        v.number_of_services = Some(6);
        v.mot_expiry_date = Some(Utc::now() + chrono::Duration::days(200));
        assert!(vehicle_condition(&v) > 0.9);
    }

    #[test]
    fn vehicle_condition_penalises_high_mileage_and_no_history() {
        let mut v = vehicle("a", "Ford", "Focus", 15_000.0, 150_000);
        v.service_history_present = false;
        v.number_of_services = None;
        v.mot_expiry_date = None;
        assert!(vehicle_condition(&v) < 0.2);
    }

    #[test]
    fn recency_uses_discrete_age_bands() {
        let mut v = vehicle("a", "Ford", "Focus", 15_000.0, 20_000);
        v.registration_date = Some(Utc::now() - chrono::Duration::days(200));
        assert_eq!(recency(&v), 1.0);
        v.registration_date = Some(Utc::now() - chrono::Duration::days(365 * 4));
        assert_eq!(recency(&v), 0.6);
        v.registration_date = None;
        assert_eq!(recency(&v), 0.5);
    }
}
