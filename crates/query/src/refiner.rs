//! Refiner (spec.md §4.5): merges a turn's new constraints into the
//! session's active filters (last-write-wins per field) and resolves
//! references to the previous turn's results ("cheaper ones", "lower
//! mileage", "remove the price limit", "more like that one").

use autolot_core::{ConstraintValue, LastResultRef, Operator, ScalarValue, SearchConstraint, SearchState};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeDiff {
    pub added_fields: Vec<String>,
    pub updated_fields: Vec<String>,
    pub removed_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RefineOutcome {
    Merged { constraints: Vec<SearchConstraint>, diff: MergeDiff },
    /// "more like that one" when the previous turn's results had more than
    /// one candidate: the caller must re-prompt rather than guess.
    UnresolvedReference { candidates: Vec<LastResultRef> },
}

enum Reference {
    Constraint(SearchConstraint),
    RemoveField(&'static str),
    Ambiguous,
}

#[derive(Default)]
pub struct Refiner;

impl Refiner {
    pub fn new() -> Self {
        Self
    }

    pub fn refine(&self, utterance: &str, new_constraints: &[SearchConstraint], state: &SearchState) -> RefineOutcome {
        match resolve_reference(utterance, state) {
            Some(Reference::Constraint(c)) => self.merge(&[c], state),
            Some(Reference::RemoveField(field)) => self.remove(field, state),
            Some(Reference::Ambiguous) => {
                RefineOutcome::UnresolvedReference { candidates: state.last_results.clone() }
            }
            None => self.merge(new_constraints, state),
        }
    }

    fn merge(&self, new_constraints: &[SearchConstraint], state: &SearchState) -> RefineOutcome {
        let mut filters = state.active_filters.clone();
        let mut diff = MergeDiff::default();

        for c in new_constraints {
            match filters.insert(c.field_name.clone(), c.clone()) {
                Some(prev) if prev == *c => {}
                Some(_) => diff.updated_fields.push(c.field_name.clone()),
                None => diff.added_fields.push(c.field_name.clone()),
            }
        }

        RefineOutcome::Merged { constraints: filters.into_values().collect(), diff }
    }

    fn remove(&self, field: &str, state: &SearchState) -> RefineOutcome {
        let mut filters = state.active_filters.clone();
        let mut diff = MergeDiff::default();
        if filters.remove(field).is_some() {
            diff.removed_fields.push(field.to_string());
        }
        RefineOutcome::Merged { constraints: filters.into_values().collect(), diff }
    }
}

fn resolve_reference(utterance: &str, state: &SearchState) -> Option<Reference> {
    let lower = utterance.to_lowercase();

    let wants_removal = lower.contains("remove") || lower.contains("undo") || lower.contains("forget") || lower.contains("no budget");
    if wants_removal && (lower.contains("price") || lower.contains("budget")) {
        return Some(Reference::RemoveField("price"));
    }

    if lower.contains("cheaper") {
        return min_of(&state.last_results, |r| r.price)
            .map(|min_price| Reference::Constraint(le_price("price", min_price - 0.01)));
    }

    if lower.contains("lower mileage") || lower.contains("less mileage") || lower.contains("fewer miles") {
        return min_of(&state.last_results, |r| r.mileage as f64)
            .map(|min_mileage| Reference::Constraint(le_price("mileage", min_mileage)));
    }

    if lower.contains("like that one") || lower.contains("similar to that") || lower.contains("more like that") {
        return match state.last_results.len() {
            0 => None,
            1 => None,
            _ => Some(Reference::Ambiguous),
        };
    }

    None
}

fn min_of(results: &[LastResultRef], f: impl Fn(&LastResultRef) -> f64) -> Option<f64> {
    results.iter().map(f).fold(None, |acc, v| match acc {
        None => Some(v),
        Some(current) => Some(current.min(v)),
    })
}

fn le_price(field: &str, value: f64) -> SearchConstraint {
    SearchConstraint::range(field, Operator::Le, ConstraintValue::Scalar(ScalarValue::Number(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_core::ConstraintKind;

    fn state_with_results(prices: &[(f64, i64)]) -> SearchState {
        let mut state = SearchState::default();
        state.last_results = prices
            .iter()
            .enumerate()
            .map(|(i, (price, mileage))| LastResultRef { id: i.to_string(), price: *price, mileage: *mileage })
            .collect();
        state
    }

    #[test]
    fn new_constraint_on_untouched_field_is_added() {
        let state = SearchState::default();
        let make = SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("BMW".into()));
        let outcome = Refiner::new().refine("show me a BMW", &[make], &state);
        match outcome {
            RefineOutcome::Merged { diff, .. } => assert_eq!(diff.added_fields, vec!["make".to_string()]),
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn overwriting_an_existing_field_is_an_update() {
        let mut state = SearchState::default();
        state.active_filters.insert(
            "make".to_string(),
            SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("Audi".into())),
        );
        let make = SearchConstraint::exact("make", Operator::Eq, ScalarValue::Text("BMW".into()));
        let outcome = Refiner::new().refine("actually a BMW", &[make], &state);
        match outcome {
            RefineOutcome::Merged { diff, constraints } => {
                assert_eq!(diff.updated_fields, vec!["make".to_string()]);
                assert_eq!(constraints.len(), 1);
            }
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn cheaper_ones_resolves_against_last_results_minimum() {
        let state = state_with_results(&[(15_000.0, 40_000), (12_000.0, 20_000)]);
        let outcome = Refiner::new().refine("any cheaper ones?", &[], &state);
        match outcome {
            RefineOutcome::Merged { constraints, diff } => {
                assert_eq!(diff.added_fields, vec!["price".to_string()]);
                let price = constraints.iter().find(|c| c.field_name == "price").unwrap();
                assert_eq!(price.operator, Operator::Le);
                assert_eq!(price.kind, ConstraintKind::Range);
            }
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn more_like_that_one_is_ambiguous_with_multiple_candidates() {
        let state = state_with_results(&[(15_000.0, 40_000), (12_000.0, 20_000)]);
        let outcome = Refiner::new().refine("more like that one", &[], &state);
        assert!(matches!(outcome, RefineOutcome::UnresolvedReference { .. }));
    }

    #[test]
    fn remove_price_limit_strips_the_price_constraint() {
        let mut state = SearchState::default();
        state.active_filters.insert(
            "price".to_string(),
            SearchConstraint::range("price", Operator::Le, ConstraintValue::Scalar(ScalarValue::Number(20_000.0))),
        );
        let outcome = Refiner::new().refine("remove the price limit", &[], &state);
        match outcome {
            RefineOutcome::Merged { constraints, diff } => {
                assert_eq!(diff.removed_fields, vec!["price".to_string()]);
                assert!(constraints.is_empty());
            }
            _ => panic!("expected merge"),
        }
    }
}
