//! Field constraints produced by the Mapper and consumed by the Composer,
//! Orchestrator, and Ranker.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Between,
    Contains,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Exact,
    Range,
    Semantic,
    Composite,
}

/// The dynamically-typed constraint value re-expressed as a tagged variant
/// (spec.md §9, Design Note on dynamic constraint values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ConstraintValue {
    Scalar(ScalarValue),
    Pair(ScalarValue, ScalarValue),
    Set(Vec<ScalarValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl ScalarValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConstraint {
    pub field_name: String,
    pub operator: Operator,
    pub value: ConstraintValue,
    pub kind: ConstraintKind,
    /// Present only on Semantic constraints: the qualitative term that
    /// produced this constraint (e.g. "reliable").
    pub originating_term: Option<String>,
    /// Weight this constraint carries within its concept (Semantic) or a
    /// default of 1.0 for Exact/Range constraints.
    pub weight: f64,
}

impl SearchConstraint {
    pub fn exact(field_name: impl Into<String>, operator: Operator, value: ScalarValue) -> Self {
        Self {
            field_name: field_name.into(),
            operator,
            value: ConstraintValue::Scalar(value),
            kind: ConstraintKind::Exact,
            originating_term: None,
            weight: 1.0,
        }
    }

    pub fn range(field_name: impl Into<String>, operator: Operator, value: ConstraintValue) -> Self {
        Self {
            field_name: field_name.into(),
            operator,
            value,
            kind: ConstraintKind::Range,
            originating_term: None,
            weight: 1.0,
        }
    }

    pub fn semantic(
        field_name: impl Into<String>,
        operator: Operator,
        value: ScalarValue,
        originating_term: impl Into<String>,
        weight: f64,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            operator,
            value: ConstraintValue::Scalar(value),
            kind: ConstraintKind::Semantic,
            originating_term: Some(originating_term.into()),
            weight,
        }
    }

    /// Invariant check: operator must be type-compatible with its value
    /// (Between requires a Pair, In requires a Set).
    pub fn is_well_formed(&self) -> bool {
        match (self.operator, &self.value) {
            (Operator::Between, ConstraintValue::Pair(_, _)) => true,
            (Operator::Between, _) => false,
            (Operator::In, ConstraintValue::Set(_)) => true,
            (Operator::In, _) => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_requires_pair() {
        let c = SearchConstraint::range(
            "price",
            Operator::Between,
            ConstraintValue::Pair(ScalarValue::Number(10_000.0), ScalarValue::Number(20_000.0)),
        );
        assert!(c.is_well_formed());

        let bad = SearchConstraint::exact("price", Operator::Between, ScalarValue::Number(1.0));
        assert!(!bad.is_well_formed());
    }

    #[test]
    fn in_requires_set() {
        let c = SearchConstraint {
            value: ConstraintValue::Set(vec![ScalarValue::Text("Petrol".into())]),
            ..SearchConstraint::exact("fuelType", Operator::In, ScalarValue::Text("Petrol".into()))
        };
        assert!(c.is_well_formed());
    }

    #[test]
    fn eq_scalar_is_well_formed() {
        let c = SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("BMW".into()));
        assert!(c.is_well_formed());
    }
}
