//! Entity→field mapping table (spec.md §4.3) and the closed whitelist of
//! backend field names the Composer's filter translator is allowed to emit
//! (spec.md §4.4).

use autolot_core::{EntityType, Operator};

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub entity_type: EntityType,
    pub field_name: &'static str,
    pub default_operator: Operator,
}

#[derive(Debug, Clone)]
pub struct FieldTable {
    pub mappings: Vec<FieldMapping>,
    pub whitelist: Vec<&'static str>,
}

impl Default for FieldTable {
    fn default() -> Self {
        let mappings = vec![
            FieldMapping { entity_type: EntityType::Make, field_name: "make", default_operator: Operator::Eq },
            FieldMapping { entity_type: EntityType::Model, field_name: "model", default_operator: Operator::Contains },
            FieldMapping {
                entity_type: EntityType::Derivative,
                field_name: "derivative",
                default_operator: Operator::Contains,
            },
            FieldMapping { entity_type: EntityType::Price, field_name: "price", default_operator: Operator::Eq },
            FieldMapping {
                entity_type: EntityType::PriceRange,
                field_name: "price",
                default_operator: Operator::Between,
            },
            FieldMapping { entity_type: EntityType::Mileage, field_name: "mileage", default_operator: Operator::Eq },
            FieldMapping {
                entity_type: EntityType::EngineSize,
                field_name: "engineSize",
                default_operator: Operator::Eq,
            },
            FieldMapping {
                entity_type: EntityType::FuelType,
                field_name: "fuelType",
                default_operator: Operator::Eq,
            },
            FieldMapping {
                entity_type: EntityType::Transmission,
                field_name: "transmissionType",
                default_operator: Operator::Eq,
            },
            FieldMapping {
                entity_type: EntityType::BodyType,
                field_name: "bodyType",
                default_operator: Operator::Eq,
            },
            FieldMapping { entity_type: EntityType::Colour, field_name: "colour", default_operator: Operator::Eq },
            FieldMapping {
                entity_type: EntityType::Feature,
                field_name: "features",
                default_operator: Operator::Contains,
            },
            FieldMapping {
                entity_type: EntityType::Location,
                field_name: "saleLocation",
                default_operator: Operator::Eq,
            },
            // Year maps to registrationDate with Ge per spec.md §4.3's
            // "default operator per entity type ... Year=Ge".
            FieldMapping {
                entity_type: EntityType::Year,
                field_name: "registrationDate",
                default_operator: Operator::Ge,
            },
        ];

        let whitelist = vec![
            "make", "model", "derivative", "price", "mileage", "bodyType", "fuelType",
            "transmissionType", "colour", "engineSize", "numberOfDoors", "registrationDate",
            "motExpiryDate", "lastServiceDate", "saleLocation", "channel", "features",
            "declarations", "serviceHistoryPresent", "numberOfServices",
        ];

        Self { mappings, whitelist }
    }
}

impl FieldTable {
    pub fn field_for(&self, entity_type: EntityType) -> Option<&FieldMapping> {
        self.mappings.iter().find(|m| m.entity_type == entity_type)
    }

    pub fn is_whitelisted(&self, field_name: &str) -> bool {
        self.whitelist.contains(&field_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_maps_to_eq() {
        let table = FieldTable::default();
        let m = table.field_for(EntityType::Make).unwrap();
        assert_eq!(m.field_name, "make");
        assert_eq!(m.default_operator, Operator::Eq);
    }

    #[test]
    fn model_uses_contains() {
        let table = FieldTable::default();
        let m = table.field_for(EntityType::Model).unwrap();
        assert_eq!(m.default_operator, Operator::Contains);
    }

    #[test]
    fn whitelist_rejects_unknown_field() {
        let table = FieldTable::default();
        assert!(table.is_whitelisted("price"));
        assert!(!table.is_whitelisted("internalNotes"));
    }
}
