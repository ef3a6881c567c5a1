//! Composer: groups mapped constraints, resolves conflicts, and translates
//! the result into a backend filter expression (spec.md §4.4).

use autolot_config::FieldTable;
use autolot_core::{
    ComposedQuery, ConstraintGroup, ConstraintKind, ConstraintValue, LogicalOp, MappedQuery,
    Operator, QueryType, ScalarValue, SearchConstraint,
};
use std::collections::BTreeMap;

/// Backend fields that hold a collection of values rather than a scalar,
/// so a Contains constraint against them needs a lambda/any expression
/// instead of a single-value match.
const COLLECTION_FIELDS: &[&str] = &["features", "declarations"];

pub struct Composer {
    fields: FieldTable,
}

impl Composer {
    pub fn new(fields: FieldTable) -> Self {
        Self { fields }
    }

    pub fn compose(&self, mapped: &MappedQuery) -> ComposedQuery {
        let query_type = classify(&mapped.constraints);
        let mut warnings: Vec<String> = Vec::new();
        let mut has_conflicts = false;

        let (mut groups, inter_group_op) = if mapped.has_or_operator() {
            (group_by_field(&mapped.constraints), LogicalOp::Or)
        } else {
            (group_by_priority(&mapped.constraints), LogicalOp::And)
        };

        for group in &mut groups {
            resolve_conflicts(group, &mut warnings, &mut has_conflicts);
        }
        groups.retain(|g| !g.constraints.is_empty());

        let filter_expression = match translate(&groups, inter_group_op, &self.fields) {
            Ok(expr) => expr,
            Err(msg) => {
                warnings.push(msg);
                has_conflicts = true;
                String::new()
            }
        };

        ComposedQuery { groups, inter_group_op, warnings, has_conflicts, filter_expression, query_type }
    }
}

fn priority_of(constraint: &SearchConstraint) -> f64 {
    match constraint.kind {
        ConstraintKind::Exact if constraint.field_name == "make" || constraint.field_name == "model" => 1.0,
        ConstraintKind::Exact => 0.9,
        ConstraintKind::Range => 0.6,
        ConstraintKind::Semantic => 0.3,
        ConstraintKind::Composite => 0.5,
    }
}

fn classify(constraints: &[SearchConstraint]) -> QueryType {
    let has_semantic = constraints.iter().any(|c| c.kind == ConstraintKind::Semantic);
    let has_composite = constraints.iter().any(|c| c.kind == ConstraintKind::Composite);
    let exact_or_range = constraints
        .iter()
        .filter(|c| matches!(c.kind, ConstraintKind::Exact | ConstraintKind::Range))
        .count();
    let has_exact = constraints.iter().any(|c| c.kind == ConstraintKind::Exact);
    let has_range = constraints.iter().any(|c| c.kind == ConstraintKind::Range);

    if has_composite || (exact_or_range > 3 && has_exact && has_range) {
        QueryType::Complex
    } else if has_semantic && (has_exact || has_range) {
        QueryType::MultiModal
    } else if exact_or_range >= 2 {
        QueryType::Filtered
    } else {
        QueryType::Simple
    }
}

fn group_by_field(constraints: &[SearchConstraint]) -> Vec<ConstraintGroup> {
    let mut by_field: BTreeMap<String, Vec<SearchConstraint>> = BTreeMap::new();
    for c in constraints {
        by_field.entry(c.field_name.clone()).or_default().push(c.clone());
    }
    by_field
        .into_values()
        .map(|group| {
            let priority = group.iter().map(priority_of).sum::<f64>() / group.len() as f64;
            ConstraintGroup { constraints: group, op: LogicalOp::Or, priority }
        })
        .collect()
}

fn group_by_priority(constraints: &[SearchConstraint]) -> Vec<ConstraintGroup> {
    let mut high = Vec::new();
    let mut medium = Vec::new();
    let mut low = Vec::new();

    for c in constraints {
        let p = priority_of(c);
        if p >= 0.8 {
            high.push(c.clone());
        } else if p >= 0.5 {
            medium.push(c.clone());
        } else {
            low.push(c.clone());
        }
    }

    [(high, 0.9), (medium, 0.55), (low, 0.3)]
        .into_iter()
        .filter(|(group, _)| !group.is_empty())
        .map(|(constraints, priority)| ConstraintGroup { constraints, op: LogicalOp::And, priority })
        .collect()
}

/// Per-field conflict detection and resolution within an And-group: merges
/// overlapping ranges into a tightened interval, drops a field entirely
/// when the merge is empty, and flags contradictory Eq values without
/// guessing a winner.
fn resolve_conflicts(group: &mut ConstraintGroup, warnings: &mut Vec<String>, has_conflicts: &mut bool) {
    if group.op != LogicalOp::And {
        return;
    }

    let mut by_field: BTreeMap<String, Vec<SearchConstraint>> = BTreeMap::new();
    for c in group.constraints.drain(..) {
        by_field.entry(c.field_name.clone()).or_default().push(c);
    }

    let mut resolved = Vec::new();
    for (field, field_constraints) in by_field {
        if field_constraints.len() == 1 {
            resolved.push(field_constraints.into_iter().next().unwrap());
            continue;
        }

        let eq_values: Vec<&ScalarValue> = field_constraints
            .iter()
            .filter(|c| c.operator == Operator::Eq)
            .filter_map(|c| match &c.value {
                ConstraintValue::Scalar(v) => Some(v),
                _ => None,
            })
            .collect();
        let distinct_eq: std::collections::HashSet<String> =
            eq_values.iter().map(|v| format!("{v:?}")).collect();
        if distinct_eq.len() > 1 {
            warnings.push(format!("contradictory values for '{field}'"));
            *has_conflicts = true;
            resolved.extend(field_constraints);
            continue;
        }

        if let Some(merged) = merge_range(&field, &field_constraints) {
            resolved.push(merged);
        } else if field_constraints.iter().any(|c| matches!(
            c.operator,
            Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le | Operator::Between
        )) {
            warnings.push(format!("conflicting range for '{field}', dropping"));
            *has_conflicts = true;
        } else {
            resolved.extend(field_constraints);
        }
    }

    group.constraints = resolved;
}

/// Attempts to tighten overlapping numeric-range constraints on one field
/// into a single interval. Returns `None` when the field has no range
/// constraints to merge (so the caller falls through to other handling).
fn merge_range(field: &str, constraints: &[SearchConstraint]) -> Option<SearchConstraint> {
    let mut lower = f64::NEG_INFINITY;
    let mut upper = f64::INFINITY;
    let mut saw_range = false;

    for c in constraints {
        match (c.operator, &c.value) {
            (Operator::Ge | Operator::Gt, ConstraintValue::Scalar(ScalarValue::Number(n))) => {
                lower = lower.max(*n);
                saw_range = true;
            }
            (Operator::Le | Operator::Lt, ConstraintValue::Scalar(ScalarValue::Number(n))) => {
                upper = upper.min(*n);
                saw_range = true;
            }
            (Operator::Between, ConstraintValue::Pair(ScalarValue::Number(lo), ScalarValue::Number(hi))) => {
                lower = lower.max(*lo);
                upper = upper.min(*hi);
                saw_range = true;
            }
            _ => {}
        }
    }

    if !saw_range {
        return None;
    }
    if lower > upper {
        return None;
    }

    Some(match (lower.is_finite(), upper.is_finite()) {
        (true, true) => SearchConstraint::range(
            field,
            Operator::Between,
            ConstraintValue::Pair(ScalarValue::Number(lower), ScalarValue::Number(upper)),
        ),
        (true, false) => SearchConstraint::range(field, Operator::Ge, ConstraintValue::Scalar(ScalarValue::Number(lower))),
        (false, true) => SearchConstraint::range(field, Operator::Le, ConstraintValue::Scalar(ScalarValue::Number(upper))),
        (false, false) => return None,
    })
}

fn translate(groups: &[ConstraintGroup], inter_group_op: LogicalOp, fields: &FieldTable) -> Result<String, String> {
    let mut clauses = Vec::new();
    for group in groups {
        let mut constraint_clauses = Vec::new();
        for c in &group.constraints {
            // Semantic constraints are resolved against vehicle attribute
            // weights / the vector query, never against the filter
            // whitelist — see executors::semantic_query_text.
            if c.kind == ConstraintKind::Semantic {
                continue;
            }
            if !fields.is_whitelisted(&c.field_name) {
                return Err(format!("field '{}' is not whitelisted", c.field_name));
            }
            constraint_clauses.push(translate_constraint(c)?);
        }
        if constraint_clauses.is_empty() {
            continue;
        }
        let joiner = match group.op {
            LogicalOp::And => " and ",
            LogicalOp::Or => " or ",
        };
        let joined = constraint_clauses.join(joiner);
        clauses.push(if constraint_clauses.len() > 1 { format!("({joined})") } else { joined });
    }

    if clauses.is_empty() {
        return Err("no constraints survived composition".to_string());
    }

    let joiner = match inter_group_op {
        LogicalOp::And => " and ",
        LogicalOp::Or => " or ",
    };
    Ok(clauses.join(joiner))
}

fn translate_constraint(c: &SearchConstraint) -> Result<String, String> {
    let field = c.field_name.as_str();
    match (c.operator, &c.value) {
        (Operator::Eq, ConstraintValue::Scalar(v)) => Ok(format!("{field} eq {}", format_scalar(v))),
        (Operator::Ne, ConstraintValue::Scalar(v)) => Ok(format!("{field} ne {}", format_scalar(v))),
        (Operator::Gt, ConstraintValue::Scalar(v)) => Ok(format!("{field} gt {}", format_scalar(v))),
        (Operator::Ge, ConstraintValue::Scalar(v)) => Ok(format!("{field} ge {}", format_scalar(v))),
        (Operator::Lt, ConstraintValue::Scalar(v)) => Ok(format!("{field} lt {}", format_scalar(v))),
        (Operator::Le, ConstraintValue::Scalar(v)) => Ok(format!("{field} le {}", format_scalar(v))),
        (Operator::Between, ConstraintValue::Pair(lo, hi)) => {
            Ok(format!("({field} ge {} and {field} le {})", format_scalar(lo), format_scalar(hi)))
        }
        (Operator::Contains, ConstraintValue::Scalar(ScalarValue::Text(v))) => {
            if COLLECTION_FIELDS.contains(&field) {
                Ok(format!("{field}/any(x: x eq '{}')", escape(v)))
            } else {
                Ok(format!("match('{}', {field})", escape(v)))
            }
        }
        (Operator::In, ConstraintValue::Set(values)) => {
            let joined = values
                .iter()
                .filter_map(|v| v.as_text())
                .collect::<Vec<_>>()
                .join(",");
            Ok(format!("in({field}, \"{joined}\", \",\")"))
        }
        _ => Err(format!("operator/value mismatch composing field '{field}'")),
    }
}

fn format_scalar(v: &ScalarValue) -> String {
    match v {
        ScalarValue::Number(n) => format!("{n}"),
        ScalarValue::Text(s) => format!("'{}'", escape(s)),
        ScalarValue::Bool(b) => b.to_string(),
    }
}

fn escape(s: &str) -> String {
    s.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_core::SearchConstraint;

    fn composer() -> Composer {
        Composer::new(FieldTable::default())
    }

    #[test]
    fn single_eq_constraint_is_simple_and_filterable() {
        let mut mapped = MappedQuery::new();
        mapped.constraints.push(SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("BMW".into())));
        let composed = composer().compose(&mapped);
        assert_eq!(composed.query_type, QueryType::Simple);
        assert_eq!(composed.filter_expression, "make eq 'BMW'");
        assert!(composed.is_valid());
    }

    #[test]
    fn two_exact_constraints_are_filtered_and_anded() {
        let mut mapped = MappedQuery::new();
        mapped.constraints.push(SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("BMW".into())));
        mapped.constraints.push(SearchConstraint::exact("fuelType", Operator::Eq, ScalarValue::Text("Petrol".into())));
        let composed = composer().compose(&mapped);
        assert_eq!(composed.query_type, QueryType::Filtered);
        assert!(composed.filter_expression.contains(" and "));
    }

    #[test]
    fn overlapping_ranges_merge_into_tightened_interval() {
        let mut mapped = MappedQuery::new();
        mapped.constraints.push(SearchConstraint::range(
            "price",
            Operator::Le,
            ConstraintValue::Scalar(ScalarValue::Number(30_000.0)),
        ));
        mapped.constraints.push(SearchConstraint::range(
            "price",
            Operator::Ge,
            ConstraintValue::Scalar(ScalarValue::Number(10_000.0)),
        ));
        let composed = composer().compose(&mapped);
        assert!(!composed.has_conflicts);
        assert_eq!(composed.groups[0].constraints.len(), 1);
        assert_eq!(composed.groups[0].constraints[0].operator, Operator::Between);
    }

    #[test]
    fn inverted_range_is_flagged_and_dropped() {
        let mut mapped = MappedQuery::new();
        mapped.constraints.push(SearchConstraint::range(
            "price",
            Operator::Ge,
            ConstraintValue::Scalar(ScalarValue::Number(30_000.0)),
        ));
        mapped.constraints.push(SearchConstraint::range(
            "price",
            Operator::Le,
            ConstraintValue::Scalar(ScalarValue::Number(10_000.0)),
        ));
        let composed = composer().compose(&mapped);
        assert!(composed.has_conflicts);
        assert!(!composed.warnings.is_empty());
    }

    #[test]
    fn contradictory_eq_values_are_flagged_not_guessed() {
        let mut mapped = MappedQuery::new();
        mapped.constraints.push(SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("BMW".into())));
        mapped.constraints.push(SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("Audi".into())));
        let composed = composer().compose(&mapped);
        assert!(composed.has_conflicts);
    }

    #[test]
    fn or_operator_groups_by_field_with_or_join() {
        let mut mapped = MappedQuery::new();
        mapped.constraints.push(SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("BMW".into())));
        mapped.constraints.push(SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("Audi".into())));
        mapped.metadata.insert("hasOrOperator".to_string(), "true".to_string());
        let composed = composer().compose(&mapped);
        assert_eq!(composed.inter_group_op, LogicalOp::And);
        assert_eq!(composed.groups[0].op, LogicalOp::Or);
        assert!(composed.filter_expression.contains(" or "));
        assert!(!composed.has_conflicts);
    }

    #[test]
    fn feature_contains_uses_lambda_any_not_match() {
        let mut mapped = MappedQuery::new();
        mapped
            .constraints
            .push(SearchConstraint::exact("features", Operator::Contains, ScalarValue::Text("Leather Seats".into())));
        let composed = composer().compose(&mapped);
        assert!(composed.filter_expression.contains("features/any"));
    }

    #[test]
    fn unwhitelisted_field_invalidates_the_query() {
        let mut mapped = MappedQuery::new();
        mapped
            .constraints
            .push(SearchConstraint::exact("internalNotes", Operator::Eq, ScalarValue::Text("x".into())));
        let composed = composer().compose(&mapped);
        assert!(!composed.is_valid());
    }

    /// "Reliable BMW under £20,000": a qualitative concept term maps to a
    /// Semantic constraint on a field outside the filter whitelist
    /// (`motExpiryDays`), and must not block the Exact/Range clauses it
    /// rides alongside.
    #[test]
    fn qualitative_term_on_a_non_whitelisted_field_does_not_invalidate_exact_and_range_clauses() {
        let mut mapped = MappedQuery::new();
        mapped.constraints.push(SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("BMW".into())));
        mapped.constraints.push(SearchConstraint::range(
            "price",
            Operator::Le,
            ConstraintValue::Scalar(ScalarValue::Number(20_000.0)),
        ));
        mapped.constraints.push(SearchConstraint::semantic(
            "motExpiryDays",
            Operator::Ge,
            ScalarValue::Number(180.0),
            "reliable",
            0.3,
        ));

        let composed = composer().compose(&mapped);

        assert!(!composed.has_conflicts);
        assert!(composed.is_valid());
        assert_eq!(composed.filter_expression, "make eq 'BMW' and price le 20000");
        assert!(composed.all_constraints().any(|c| c.kind == ConstraintKind::Semantic && c.field_name == "motExpiryDays"));
    }
}
