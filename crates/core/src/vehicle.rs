//! The immutable vehicle record produced by the external search index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub make: String,
    pub model: String,
    pub derivative: String,
    pub price: f64,
    pub mileage: i64,
    pub body_type: String,
    pub fuel_type: String,
    pub transmission_type: String,
    pub colour: String,
    pub engine_size: f64,
    pub number_of_doors: Option<i32>,
    pub registration_date: Option<DateTime<Utc>>,
    pub mot_expiry_date: Option<DateTime<Utc>>,
    pub last_service_date: Option<DateTime<Utc>>,
    pub sale_location: String,
    pub channel: String,
    pub features: BTreeSet<String>,
    pub declarations: BTreeSet<String>,
    pub service_history_present: bool,
    pub number_of_services: Option<i32>,
    pub description: String,
    pub embedding: Vec<f32>,
}

impl Vehicle {
    /// True if the vehicle carries any accident/damage declaration.
    pub fn has_damage_declaration(&self) -> bool {
        self.declarations
            .iter()
            .any(|d| d.eq_ignore_ascii_case("damage") || d.eq_ignore_ascii_case("accident"))
    }

    pub fn registration_year(&self) -> Option<i32> {
        self.registration_date.map(|d| d.date_naive().format("%Y").to_string().parse().unwrap_or(0))
    }
}
