//! Orchestrator (spec.md §4.6): picks a `SearchStrategy` from the shape of a
//! composed query and dispatches to the matching executor.

use autolot_config::{ConceptTable, SearchConfig};
use autolot_core::{
    ComposedQuery, ConstraintKind, ConstraintValue, Embedder, Operator, RelaxationHint, Result, ScalarValue,
    SearchIndex, SearchStrategy, VehicleResult,
};
use std::sync::Arc;

use crate::executors::{ExactExecutor, HybridExecutor, SemanticExecutor};

pub struct Orchestrator {
    exact: ExactExecutor,
    semantic: SemanticExecutor,
    hybrid: HybridExecutor,
}

impl Orchestrator {
    pub fn new(index: Arc<dyn SearchIndex>, embedder: Arc<dyn Embedder>, concepts: ConceptTable, config: SearchConfig) -> Self {
        Self {
            exact: ExactExecutor::new(index.clone()),
            semantic: SemanticExecutor::new(index.clone(), embedder.clone(), concepts.clone(), config.clone()),
            hybrid: HybridExecutor::new(index, embedder, concepts, config, false),
        }
    }

    /// Selects a strategy from the constraint mix: no qualitative terms runs
    /// exact-only, no exact/range constraints runs semantic-only, a mix of
    /// both runs hybrid weighted by the number of exact constraints
    /// (spec.md §4.6).
    pub fn select_strategy(composed: &ComposedQuery) -> SearchStrategy {
        let exact_count = composed
            .all_constraints()
            .filter(|c| matches!(c.kind, ConstraintKind::Exact | ConstraintKind::Range | ConstraintKind::Composite))
            .count();
        let semantic_count = composed.all_constraints().filter(|c| c.kind == ConstraintKind::Semantic).count();

        if semantic_count == 0 {
            SearchStrategy::exact_only()
        } else if exact_count == 0 {
            SearchStrategy::semantic_only()
        } else {
            SearchStrategy::hybrid(exact_count)
        }
    }

    pub async fn search(
        &self,
        composed: &ComposedQuery,
        top_k: usize,
    ) -> Result<(Vec<VehicleResult>, SearchStrategy, Option<RelaxationHint>)> {
        let strategy = Self::select_strategy(composed);

        let results = match strategy.strategy_type {
            autolot_core::StrategyType::ExactOnly => self.exact.execute(composed, top_k).await?,
            autolot_core::StrategyType::SemanticOnly => self.semantic.execute(composed, top_k).await?,
            autolot_core::StrategyType::Hybrid => self.hybrid.execute(composed, &strategy, top_k).await?,
        };

        let relaxation = if results.is_empty() { propose_relaxation(composed) } else { None };

        Ok((results, strategy, relaxation))
    }
}

/// The factor by which a field's upper bound is loosened when proposed as a
/// relaxation; unlisted numeric fields fall back to a flat 2x.
fn relaxation_factor(field: &str) -> f64 {
    match field {
        "price" => 2.5,
        "mileage" => 10.0,
        _ => 2.0,
    }
}

/// Picks the most over-constraining Range field from a zero-result query and
/// proposes a loosened value for it (spec.md §8 S4). Prefers price, then
/// mileage, then whatever other numeric Range field is present.
fn propose_relaxation(composed: &ComposedQuery) -> Option<RelaxationHint> {
    const PRIORITY: &[&str] = &["price", "mileage"];

    let mut candidates: Vec<(&str, f64)> = Vec::new();
    for c in composed.all_constraints() {
        if c.kind != ConstraintKind::Range {
            continue;
        }
        match (c.operator, &c.value) {
            (Operator::Le | Operator::Lt, ConstraintValue::Scalar(ScalarValue::Number(n))) => {
                candidates.push((c.field_name.as_str(), *n));
            }
            (Operator::Between, ConstraintValue::Pair(_, ScalarValue::Number(hi))) => {
                candidates.push((c.field_name.as_str(), *hi));
            }
            _ => {}
        }
    }

    candidates.sort_by_key(|(field, _)| PRIORITY.iter().position(|p| p == field).unwrap_or(usize::MAX));
    let (field, value) = candidates.into_iter().next()?;

    let suggested_value = value * relaxation_factor(field);
    let message = format!("Try increasing {field} to {suggested_value:.0} to see more results.");
    Some(RelaxationHint { field: field.to_string(), message, suggested_value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_core::{ComposedQuery, ConstraintGroup, LogicalOp, Operator, QueryType, ScalarValue, SearchConstraint};

    fn exact_group() -> ConstraintGroup {
        ConstraintGroup {
            constraints: vec![SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("BMW".to_string()))],
            op: LogicalOp::And,
            priority: 1.0,
        }
    }

    fn semantic_group() -> ConstraintGroup {
        ConstraintGroup {
            constraints: vec![SearchConstraint::semantic("reliability", Operator::Ge, ScalarValue::Number(0.5), "reliable", 0.3)],
            op: LogicalOp::And,
            priority: 0.3,
        }
    }

    #[test]
    fn exact_only_constraints_select_exact_strategy() {
        let composed = ComposedQuery {
            groups: vec![exact_group()],
            inter_group_op: LogicalOp::And,
            warnings: vec![],
            has_conflicts: false,
            filter_expression: "make eq 'BMW'".to_string(),
            query_type: QueryType::Filtered,
        };
        let strategy = Orchestrator::select_strategy(&composed);
        assert_eq!(strategy.strategy_type, autolot_core::StrategyType::ExactOnly);
    }

    #[test]
    fn mixed_constraints_select_hybrid_strategy() {
        let composed = ComposedQuery {
            groups: vec![exact_group(), semantic_group()],
            inter_group_op: LogicalOp::And,
            warnings: vec![],
            has_conflicts: false,
            filter_expression: "make eq 'BMW'".to_string(),
            query_type: QueryType::MultiModal,
        };
        let strategy = Orchestrator::select_strategy(&composed);
        assert_eq!(strategy.strategy_type, autolot_core::StrategyType::Hybrid);
    }

    #[test]
    fn semantic_only_constraints_select_semantic_strategy() {
        let composed = ComposedQuery {
            groups: vec![semantic_group()],
            inter_group_op: LogicalOp::And,
            warnings: vec![],
            has_conflicts: false,
            filter_expression: String::new(),
            query_type: QueryType::Simple,
        };
        let strategy = Orchestrator::select_strategy(&composed);
        assert_eq!(strategy.strategy_type, autolot_core::StrategyType::SemanticOnly);
    }

    #[test]
    fn relaxation_prefers_price_over_mileage_and_loosens_it() {
        let composed = ComposedQuery {
            groups: vec![ConstraintGroup {
                constraints: vec![
                    SearchConstraint::range(
                        "price",
                        Operator::Le,
                        autolot_core::ConstraintValue::Scalar(ScalarValue::Number(10_000.0)),
                    ),
                    SearchConstraint::range(
                        "mileage",
                        Operator::Le,
                        autolot_core::ConstraintValue::Scalar(ScalarValue::Number(5_000.0)),
                    ),
                ],
                op: LogicalOp::And,
                priority: 0.6,
            }],
            inter_group_op: LogicalOp::And,
            warnings: vec![],
            has_conflicts: false,
            filter_expression: "price le 10000 and mileage le 5000".to_string(),
            query_type: QueryType::Filtered,
        };

        let hint = propose_relaxation(&composed).expect("zero-result query should propose a relaxation");
        assert_eq!(hint.field, "price");
        assert_eq!(hint.suggested_value, 25_000.0);
    }

    #[test]
    fn relaxation_is_none_when_no_range_constraints_present() {
        let composed = ComposedQuery {
            groups: vec![exact_group()],
            inter_group_op: LogicalOp::And,
            warnings: vec![],
            has_conflicts: false,
            filter_expression: "make eq 'BMW'".to_string(),
            query_type: QueryType::Simple,
        };
        assert!(propose_relaxation(&composed).is_none());
    }
}
