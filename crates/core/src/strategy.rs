//! The declarative plan produced by the Orchestrator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyType {
    ExactOnly,
    SemanticOnly,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStrategy {
    pub strategy_type: StrategyType,
    /// Named approach -> weight, summing to 1.0 (e.g. "ExactMatch" -> 1.0,
    /// or "exact"/"semantic" -> their blended weights under Hybrid).
    pub weights: Vec<(String, f64)>,
    pub should_rerank: bool,
}

impl SearchStrategy {
    pub fn exact_only() -> Self {
        Self {
            strategy_type: StrategyType::ExactOnly,
            weights: vec![("ExactMatch".to_string(), 1.0)],
            should_rerank: false,
        }
    }

    pub fn semantic_only() -> Self {
        Self {
            strategy_type: StrategyType::SemanticOnly,
            weights: vec![("SemanticSearch".to_string(), 1.0)],
            should_rerank: false,
        }
    }

    pub fn hybrid(exact_count: usize) -> Self {
        let exact_weight = (0.15 * exact_count as f64).min(0.7);
        let semantic_weight = 1.0 - exact_weight;
        Self {
            strategy_type: StrategyType::Hybrid,
            weights: vec![
                ("exact".to_string(), exact_weight),
                ("semantic".to_string(), semantic_weight),
            ],
            should_rerank: true,
        }
    }

    pub fn weight_of(&self, name: &str) -> f64 {
        self.weights
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }
}
