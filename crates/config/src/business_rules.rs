//! Ranker factor weights and business-rule adjustments (spec.md §4.8).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankerWeights {
    pub semantic_relevance: f64,
    pub exact_match_count: f64,
    pub price_competitiveness: f64,
    pub vehicle_condition: f64,
    pub recency: f64,
}

impl Default for RankerWeights {
    fn default() -> Self {
        Self {
            semantic_relevance: 0.40,
            exact_match_count: 0.25,
            price_competitiveness: 0.15,
            vehicle_condition: 0.10,
            recency: 0.10,
        }
    }
}

impl RankerWeights {
    pub fn sum(&self) -> f64 {
        self.semantic_relevance
            + self.exact_match_count
            + self.price_competitiveness
            + self.vehicle_condition
            + self.recency
    }

    /// Renormalizes weights to sum to 1.0 if they do not already (spec.md
    /// §4.8: "must sum to 1; renormalized if not").
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if (sum - 1.0).abs() < 1e-9 || sum == 0.0 {
            return *self;
        }
        Self {
            semantic_relevance: self.semantic_relevance / sum,
            exact_match_count: self.exact_match_count / sum,
            price_competitiveness: self.price_competitiveness / sum,
            vehicle_condition: self.vehicle_condition / sum,
            recency: self.recency / sum,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BusinessRuleAdjustments {
    pub premium_make_boost: f64,
    pub high_mileage_penalty: f64,
    pub high_mileage_threshold: i64,
    pub full_service_history_boost: f64,
    pub damage_declaration_penalty: f64,
    pub electric_hybrid_boost: f64,
    pub mot_expiring_penalty: f64,
    pub mot_expiring_days: i64,
}

impl Default for BusinessRuleAdjustments {
    fn default() -> Self {
        Self {
            premium_make_boost: 0.05,
            high_mileage_penalty: -0.15,
            high_mileage_threshold: 100_000,
            full_service_history_boost: 0.10,
            damage_declaration_penalty: -0.20,
            electric_hybrid_boost: 0.08,
            mot_expiring_penalty: -0.10,
            mot_expiring_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiversityConfig {
    pub max_per_make: usize,
    pub max_per_model: usize,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            max_per_make: crate::constants::diversity::MAX_PER_MAKE,
            max_per_model: crate::constants::diversity::MAX_PER_MODEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let w = RankerWeights::default();
        assert!((w.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalizes_non_unit_weights() {
        let w = RankerWeights {
            semantic_relevance: 1.0,
            exact_match_count: 1.0,
            price_competitiveness: 0.0,
            vehicle_condition: 0.0,
            recency: 0.0,
        };
        let n = w.normalized();
        assert!((n.sum() - 1.0).abs() < 1e-9);
        assert!((n.semantic_relevance - 0.5).abs() < 1e-9);
    }
}
