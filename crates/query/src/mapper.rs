//! Mapper: turns extracted entities into backend-field constraints
//! (spec.md §4.3).

use autolot_config::{ConceptTable, FieldTable};
use autolot_core::{
    ComparisonType, ConstraintValue, EntityType, EntityValue, ExtractedEntity, MappedQuery,
    Operator, ScalarValue, SearchConstraint,
};

pub struct Mapper {
    fields: FieldTable,
    concepts: ConceptTable,
}

impl Mapper {
    pub fn new(fields: FieldTable, concepts: ConceptTable) -> Self {
        Self { fields, concepts }
    }

    pub fn map(&self, entities: &[ExtractedEntity]) -> MappedQuery {
        let mut mapped = MappedQuery::new();

        for entity in entities {
            if entity.entity_type == EntityType::QualitativeTerm {
                match self.expand_qualitative(&entity.raw_value) {
                    Some(constraints) => mapped.constraints.extend(constraints),
                    None => mapped.unmappable_terms.push(entity.raw_value.clone()),
                }
                continue;
            }

            match self.map_entity(entity) {
                Some(constraint) => mapped.constraints.push(constraint),
                None => mapped.unmappable_terms.push(entity.raw_value.clone()),
            }
        }

        mapped
    }

    fn map_entity(&self, entity: &ExtractedEntity) -> Option<SearchConstraint> {
        let mapping = self.fields.field_for(entity.entity_type)?;
        let operator = entity.operator_hint.unwrap_or(mapping.default_operator);

        match &entity.value {
            EntityValue::Range(lo, hi) => Some(SearchConstraint::range(
                mapping.field_name,
                Operator::Between,
                ConstraintValue::Pair(ScalarValue::Number(*lo), ScalarValue::Number(*hi)),
            )),
            EntityValue::Number(n) if entity.entity_type == EntityType::Year => {
                let year = *n as i64;
                let date = format!("{year:04}-01-01T00:00:00Z");
                Some(SearchConstraint::exact(mapping.field_name, operator, ScalarValue::Text(date)))
            }
            EntityValue::Number(n) => {
                if *n <= 0.0 {
                    return None;
                }
                Some(SearchConstraint::exact(mapping.field_name, operator, ScalarValue::Number(*n)))
            }
            EntityValue::Text(t) => {
                Some(SearchConstraint::exact(mapping.field_name, operator, ScalarValue::Text(t.clone())))
            }
            EntityValue::None => Some(SearchConstraint::exact(
                mapping.field_name,
                operator,
                ScalarValue::Text(entity.raw_value.clone()),
            )),
        }
    }

    /// Expands a qualitative term ("reliable", "family car", ...) into its
    /// weighted Semantic constraints via the concept table (spec.md §4.7).
    fn expand_qualitative(&self, term: &str) -> Option<Vec<SearchConstraint>> {
        let concept = self.concepts.get(term)?;
        Some(
            concept
                .attributes
                .iter()
                .map(|attr| {
                    let operator = comparison_to_operator(attr.comparison_type);
                    let value = match (&attr.target_value, operator) {
                        (ScalarValue::Text(s), Operator::In) => ConstraintValue::Set(
                            s.split(',').map(|v| ScalarValue::Text(v.trim().to_string())).collect(),
                        ),
                        (other, _) => ConstraintValue::Scalar(other.clone()),
                    };
                    SearchConstraint {
                        field_name: attr.attribute_name.clone(),
                        operator,
                        value,
                        kind: autolot_core::ConstraintKind::Semantic,
                        originating_term: Some(term.to_string()),
                        weight: attr.weight,
                    }
                })
                .collect(),
        )
    }
}

fn comparison_to_operator(cmp: ComparisonType) -> Operator {
    match cmp {
        ComparisonType::Less => Operator::Lt,
        ComparisonType::Greater => Operator::Gt,
        ComparisonType::LessOrEqual => Operator::Le,
        ComparisonType::GreaterOrEqual => Operator::Ge,
        ComparisonType::Equals => Operator::Eq,
        ComparisonType::In => Operator::In,
        ComparisonType::Contains | ComparisonType::ContainsAny => Operator::Contains,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_core::Operator;

    fn mapper() -> Mapper {
        Mapper::new(FieldTable::default(), ConceptTable::default())
    }

    #[test]
    fn make_entity_maps_to_eq_constraint() {
        let entity = ExtractedEntity::new(EntityType::Make, "BMW", 0.9).with_value(EntityValue::Text("BMW".into()));
        let mapped = mapper().map(&[entity]);
        assert_eq!(mapped.constraints.len(), 1);
        assert_eq!(mapped.constraints[0].field_name, "make");
        assert_eq!(mapped.constraints[0].operator, Operator::Eq);
    }

    #[test]
    fn price_with_under_hint_becomes_le() {
        let entity = ExtractedEntity::new(EntityType::Price, "under 20000", 0.9)
            .with_value(EntityValue::Number(20_000.0))
            .with_operator_hint(Operator::Le);
        let mapped = mapper().map(&[entity]);
        assert_eq!(mapped.constraints[0].operator, Operator::Le);
    }

    #[test]
    fn year_maps_to_registration_date_as_iso8601() {
        let entity = ExtractedEntity::new(EntityType::Year, "2020", 0.9).with_value(EntityValue::Number(2020.0));
        let mapped = mapper().map(&[entity]);
        assert_eq!(mapped.constraints[0].field_name, "registrationDate");
        assert_eq!(mapped.constraints[0].operator, Operator::Ge);
        assert_eq!(
            mapped.constraints[0].value,
            ConstraintValue::Scalar(ScalarValue::Text("2020-01-01T00:00:00Z".into()))
        );
    }

    #[test]
    fn qualitative_term_expands_into_weighted_semantic_constraints() {
        let entity = ExtractedEntity::new(EntityType::QualitativeTerm, "reliable", 0.9);
        let mapped = mapper().map(&[entity]);
        assert_eq!(mapped.constraints.len(), 4);
        assert!(mapped
            .constraints
            .iter()
            .all(|c| c.kind == autolot_core::ConstraintKind::Semantic));
        let sum: f64 = mapped.constraints.iter().map(|c| c.weight).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_qualitative_term_is_unmappable() {
        let entity = ExtractedEntity::new(EntityType::QualitativeTerm, "vibey", 0.5);
        let mapped = mapper().map(&[entity]);
        assert!(mapped.constraints.is_empty());
        assert_eq!(mapped.unmappable_terms, vec!["vibey".to_string()]);
    }

    #[test]
    fn non_positive_price_is_unmappable() {
        let entity = ExtractedEntity::new(EntityType::Price, "zero", 0.5).with_value(EntityValue::Number(0.0));
        let mapped = mapper().map(&[entity]);
        assert!(mapped.constraints.is_empty());
        assert_eq!(mapped.unmappable_terms, vec!["zero".to_string()]);
    }
}
