//! Static domain vocabulary consulted by the entity extractor (spec.md §4.2):
//! dictionaries of makes, models, fuel types, transmissions, body types,
//! colours, locations, features, and their synonym foldings.

use std::collections::HashMap;

/// One dictionary entry: canonical value plus case-insensitive aliases that
/// fold onto it (spec.md §4.2, "Synonym folding").
#[derive(Debug, Clone)]
pub struct DictionaryEntry {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub struct VocabularyConfig {
    pub makes: Vec<DictionaryEntry>,
    pub models: Vec<DictionaryEntry>,
    pub fuel_types: Vec<DictionaryEntry>,
    pub transmissions: Vec<DictionaryEntry>,
    pub body_types: Vec<DictionaryEntry>,
    pub colours: Vec<DictionaryEntry>,
    pub locations: Vec<DictionaryEntry>,
    pub features: Vec<DictionaryEntry>,
    pub qualitative_terms: Vec<DictionaryEntry>,
    /// Makes considered "premium" for the ranker's business-rule boost
    /// (spec.md §4.8).
    pub premium_makes: Vec<&'static str>,
    /// Non-vehicle topic lexemes used by the guardrail's OffTopic rule
    /// (spec.md §4.1).
    pub off_topic_lexemes: Vec<&'static str>,
    /// Vehicle-domain lexemes used to rebut an OffTopic classification
    /// (spec.md §4.1, §4.2 fallback).
    pub vehicle_lexemes: Vec<&'static str>,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            makes: vec![
                DictionaryEntry { canonical: "BMW", aliases: &["beamer", "bimmer"] },
                DictionaryEntry { canonical: "Audi", aliases: &[] },
                DictionaryEntry { canonical: "Mercedes-Benz", aliases: &["merc", "mercedes"] },
                DictionaryEntry { canonical: "Volkswagen", aliases: &["vw"] },
                DictionaryEntry { canonical: "Ford", aliases: &[] },
                DictionaryEntry { canonical: "Toyota", aliases: &[] },
                DictionaryEntry { canonical: "Honda", aliases: &[] },
                DictionaryEntry { canonical: "Vauxhall", aliases: &[] },
                DictionaryEntry { canonical: "Nissan", aliases: &[] },
                DictionaryEntry { canonical: "Hyundai", aliases: &[] },
                DictionaryEntry { canonical: "Kia", aliases: &[] },
                DictionaryEntry { canonical: "Tesla", aliases: &[] },
                DictionaryEntry { canonical: "Skoda", aliases: &[] },
                DictionaryEntry { canonical: "SEAT", aliases: &[] },
                DictionaryEntry { canonical: "Land Rover", aliases: &["range rover", "landrover"] },
                DictionaryEntry { canonical: "Jaguar", aliases: &[] },
                DictionaryEntry { canonical: "Mini", aliases: &[] },
                DictionaryEntry { canonical: "Volvo", aliases: &[] },
                DictionaryEntry { canonical: "Mazda", aliases: &[] },
                DictionaryEntry { canonical: "Peugeot", aliases: &[] },
            ],
            models: vec![
                DictionaryEntry { canonical: "320d", aliases: &["3 series 320d"] },
                DictionaryEntry { canonical: "A4", aliases: &["a 4"] },
                DictionaryEntry { canonical: "A3", aliases: &["a 3"] },
                DictionaryEntry { canonical: "Golf", aliases: &[] },
                DictionaryEntry { canonical: "Polo", aliases: &[] },
                DictionaryEntry { canonical: "Civic", aliases: &[] },
                DictionaryEntry { canonical: "CR-V", aliases: &["crv"] },
                DictionaryEntry { canonical: "Qashqai", aliases: &[] },
                DictionaryEntry { canonical: "Corolla", aliases: &[] },
                DictionaryEntry { canonical: "Yaris", aliases: &[] },
                DictionaryEntry { canonical: "Focus", aliases: &[] },
                DictionaryEntry { canonical: "Fiesta", aliases: &[] },
                DictionaryEntry { canonical: "C-Class", aliases: &["c class"] },
                DictionaryEntry { canonical: "E-Class", aliases: &["e class"] },
                DictionaryEntry { canonical: "Model 3", aliases: &["model3"] },
                DictionaryEntry { canonical: "Model Y", aliases: &["modely"] },
            ],
            fuel_types: vec![
                DictionaryEntry { canonical: "Petrol", aliases: &["gas", "gasoline"] },
                DictionaryEntry { canonical: "Diesel", aliases: &[] },
                DictionaryEntry { canonical: "Electric", aliases: &["ev", "bev"] },
                DictionaryEntry { canonical: "Hybrid", aliases: &["phev", "hev"] },
            ],
            transmissions: vec![
                DictionaryEntry { canonical: "Automatic", aliases: &["auto"] },
                DictionaryEntry { canonical: "Manual", aliases: &["stick", "stick shift"] },
                DictionaryEntry { canonical: "Semi-Automatic", aliases: &["semi auto", "dsg"] },
            ],
            body_types: vec![
                DictionaryEntry { canonical: "Hatchback", aliases: &["hatch"] },
                DictionaryEntry { canonical: "Saloon", aliases: &["sedan"] },
                DictionaryEntry { canonical: "Estate", aliases: &["wagon", "touring"] },
                DictionaryEntry { canonical: "SUV", aliases: &["4x4", "suv/4x4"] },
                DictionaryEntry { canonical: "Coupe", aliases: &[] },
                DictionaryEntry { canonical: "Convertible", aliases: &["cabriolet", "cabrio"] },
                DictionaryEntry { canonical: "MPV", aliases: &["people carrier", "minivan"] },
            ],
            colours: vec![
                DictionaryEntry { canonical: "Black", aliases: &[] },
                DictionaryEntry { canonical: "White", aliases: &[] },
                DictionaryEntry { canonical: "Silver", aliases: &[] },
                DictionaryEntry { canonical: "Grey", aliases: &["gray"] },
                DictionaryEntry { canonical: "Blue", aliases: &[] },
                DictionaryEntry { canonical: "Red", aliases: &[] },
                DictionaryEntry { canonical: "Green", aliases: &[] },
            ],
            locations: vec![
                DictionaryEntry { canonical: "London", aliases: &[] },
                DictionaryEntry { canonical: "Manchester", aliases: &[] },
                DictionaryEntry { canonical: "Birmingham", aliases: &[] },
                DictionaryEntry { canonical: "Leeds", aliases: &[] },
                DictionaryEntry { canonical: "Glasgow", aliases: &[] },
            ],
            features: vec![
                DictionaryEntry { canonical: "Navigation", aliases: &["sat nav", "satnav", "gps"] },
                DictionaryEntry { canonical: "Leather Seats", aliases: &["leather interior"] },
                DictionaryEntry { canonical: "Sunroof", aliases: &["panoramic roof"] },
                DictionaryEntry { canonical: "Parking Sensors", aliases: &["parking aid"] },
                DictionaryEntry { canonical: "Heated Seats", aliases: &[] },
                DictionaryEntry { canonical: "Bluetooth", aliases: &[] },
                DictionaryEntry { canonical: "Cruise Control", aliases: &[] },
                DictionaryEntry { canonical: "Reversing Camera", aliases: &["backup camera"] },
            ],
            qualitative_terms: vec![
                DictionaryEntry { canonical: "reliable", aliases: &["dependable", "trustworthy"] },
                DictionaryEntry { canonical: "economical", aliases: &["fuel efficient", "cheap to run"] },
                DictionaryEntry { canonical: "family car", aliases: &["family friendly"] },
                DictionaryEntry { canonical: "sporty", aliases: &["fast", "performance"] },
                DictionaryEntry { canonical: "luxury", aliases: &["premium", "upmarket"] },
                DictionaryEntry { canonical: "practical", aliases: &["sensible"] },
            ],
            premium_makes: vec![
                "BMW",
                "Audi",
                "Mercedes-Benz",
                "Jaguar",
                "Land Rover",
                "Tesla",
                "Volvo",
            ],
            off_topic_lexemes: vec![
                "weather", "recipe", "joke", "football score", "movie", "stock price",
            ],
            vehicle_lexemes: vec![
                "car", "vehicle", "vehicles", "bmw", "audi", "model", "price", "mileage",
                "automatic", "manual", "diesel", "petrol", "electric", "hybrid", "suv",
                "hatchback", "saloon",
            ],
        }
    }
}

impl VocabularyConfig {
    /// Flattened (alias, canonical) pairs for a dictionary, case-folded.
    pub fn index(entries: &[DictionaryEntry]) -> HashMap<String, &'static str> {
        let mut index = HashMap::new();
        for entry in entries {
            index.insert(entry.canonical.to_lowercase(), entry.canonical);
            for alias in entry.aliases {
                index.insert(alias.to_lowercase(), entry.canonical);
            }
        }
        index
    }

    pub fn is_premium_make(&self, make: &str) -> bool {
        self.premium_makes.iter().any(|m| m.eq_ignore_ascii_case(make))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonym_folds_to_canonical() {
        let vocab = VocabularyConfig::default();
        let index = VocabularyConfig::index(&vocab.makes);
        assert_eq!(index.get("beamer"), Some(&"BMW"));
        assert_eq!(index.get("vw"), Some(&"Volkswagen"));
    }

    #[test]
    fn premium_make_lookup_is_case_insensitive() {
        let vocab = VocabularyConfig::default();
        assert!(vocab.is_premium_make("bmw"));
        assert!(!vocab.is_premium_make("Dacia"));
    }
}
