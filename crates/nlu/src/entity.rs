//! Layered entity extraction out of a free-text utterance.
//!
//! Layers run in order and feed one pool of candidate entities: numeric
//! patterns (price, mileage, year) first since they carry the most precise
//! spans, then dictionary lookups, then fuzzy make matching for anything
//! the dictionary missed. Overlap resolution keeps the highest-confidence
//! candidate per contested span.

use crate::fuzzy::best_fuzzy_match;
use autolot_config::{PatternConfig, VocabularyConfig};
use autolot_core::{EntityType, EntityValue, ExtractedEntity, Operator};
use once_cell::sync::Lazy;
use regex::Regex;

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)£?\s?(\d[\d,]*(?:\.\d+)?)\s?(k)?\b").unwrap());
static PRICE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)between\s+£?(\d[\d,]*(?:\.\d+)?)(k)?\s+and\s+£?(\d[\d,]*(?:\.\d+)?)(k)?").unwrap()
});
static MILEAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\s?(?:k\s?)?(?:miles|mileage)\b").unwrap()
});
static LOW_MILEAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\blow mileage\b").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19[0-9]{2}|20[0-2][0-9])\b").unwrap());

fn parse_magnitude(digits: &str, has_k_suffix: bool) -> Option<f64> {
    let cleaned: String = digits.chars().filter(|c| *c != ',').collect();
    let mut value: f64 = cleaned.parse().ok()?;
    if has_k_suffix {
        value *= 1000.0;
    }
    if value <= 0.0 {
        return None;
    }
    Some(value)
}

pub struct EntityExtractor {
    patterns: PatternConfig,
    vocabulary: VocabularyConfig,
}

impl EntityExtractor {
    pub fn new(patterns: PatternConfig, vocabulary: VocabularyConfig) -> Self {
        Self { patterns, vocabulary }
    }

    pub fn extract(&self, utterance: &str) -> Vec<ExtractedEntity> {
        let mut candidates = Vec::new();
        candidates.extend(self.extract_price_range(utterance));
        candidates.extend(self.extract_price(utterance));
        candidates.extend(self.extract_mileage(utterance));
        candidates.extend(self.extract_year(utterance));
        candidates.extend(self.extract_dictionary(utterance, &self.vocabulary.makes, EntityType::Make));
        candidates.extend(self.extract_dictionary(utterance, &self.vocabulary.models, EntityType::Model));
        candidates.extend(self.extract_dictionary(utterance, &self.vocabulary.fuel_types, EntityType::FuelType));
        candidates.extend(self.extract_dictionary(utterance, &self.vocabulary.transmissions, EntityType::Transmission));
        candidates.extend(self.extract_dictionary(utterance, &self.vocabulary.body_types, EntityType::BodyType));
        candidates.extend(self.extract_dictionary(utterance, &self.vocabulary.colours, EntityType::Colour));
        candidates.extend(self.extract_dictionary(utterance, &self.vocabulary.locations, EntityType::Location));
        candidates.extend(self.extract_dictionary(utterance, &self.vocabulary.features, EntityType::Feature));
        candidates.extend(self.extract_dictionary(
            utterance,
            &self.vocabulary.qualitative_terms,
            EntityType::QualitativeTerm,
        ));
        candidates.extend(self.extract_fuzzy_make(utterance, &candidates));

        resolve_overlaps(candidates)
    }

    fn operator_hint_near(&self, utterance: &str, match_start: usize) -> Option<Operator> {
        let before = &utterance[..match_start.min(utterance.len())];
        let before_lower = before.to_lowercase();
        // Look at a small window right before the match so "under £20,000
        // and a red one" doesn't bleed its operator onto "red".
        let window_start = before_lower.len().saturating_sub(20);
        let window = &before_lower[window_start..];
        self.patterns
            .operator_keywords
            .iter()
            .find(|kw| window.contains(kw.phrase))
            .map(|kw| kw.operator)
    }

    fn extract_price_range(&self, utterance: &str) -> Vec<ExtractedEntity> {
        PRICE_RANGE_RE
            .captures_iter(utterance)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let low = parse_magnitude(&caps[1], caps.get(2).is_some())?;
                let high = parse_magnitude(&caps[3], caps.get(4).is_some())?;
                Some(
                    ExtractedEntity::new(EntityType::PriceRange, whole.as_str(), 0.85)
                        .with_span(whole.start(), whole.end())
                        .with_value(EntityValue::Range(low, high))
                        .with_operator_hint(Operator::Between),
                )
            })
            .collect()
    }

    fn extract_price(&self, utterance: &str) -> Vec<ExtractedEntity> {
        let lower = utterance.to_lowercase();
        let has_digit = lower.chars().any(|c| c.is_ascii_digit());
        let has_price_context = lower.contains('£')
            || lower.contains("price")
            || lower.contains("budget")
            || self.patterns.operator_keywords.iter().any(|k| lower.contains(k.phrase));
        if !has_digit || !has_price_context {
            return Vec::new();
        }
        PRICE_RE
            .captures_iter(utterance)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let value = parse_magnitude(&caps[1], caps.get(2).is_some())?;
                let mut entity = ExtractedEntity::new(EntityType::Price, whole.as_str(), 0.75)
                    .with_span(whole.start(), whole.end())
                    .with_value(EntityValue::Number(value));
                if let Some(op) = self.operator_hint_near(utterance, whole.start()) {
                    entity = entity.with_operator_hint(op);
                }
                Some(entity)
            })
            .collect()
    }

    fn extract_mileage(&self, utterance: &str) -> Vec<ExtractedEntity> {
        let mut out = Vec::new();
        if let Some(m) = LOW_MILEAGE_RE.find(utterance) {
            out.push(
                ExtractedEntity::new(EntityType::Mileage, m.as_str(), 0.8)
                    .with_span(m.start(), m.end())
                    .with_value(EntityValue::Number(self.patterns.low_mileage_marker))
                    .with_operator_hint(Operator::Le),
            );
        }
        for caps in MILEAGE_RE.captures_iter(utterance) {
            let whole = match caps.get(0) {
                Some(w) => w,
                None => continue,
            };
            let has_k = whole.as_str().to_lowercase().contains('k');
            let value = match parse_magnitude(&caps[1], has_k) {
                Some(v) => v,
                None => continue,
            };
            let mut entity = ExtractedEntity::new(EntityType::Mileage, whole.as_str(), 0.8)
                .with_span(whole.start(), whole.end())
                .with_value(EntityValue::Number(value));
            if let Some(op) = self.operator_hint_near(utterance, whole.start()) {
                entity = entity.with_operator_hint(op);
            }
            out.push(entity);
        }
        out
    }

    fn extract_year(&self, utterance: &str) -> Vec<ExtractedEntity> {
        YEAR_RE
            .find_iter(utterance)
            .filter_map(|m| {
                let year: f64 = m.as_str().parse().ok()?;
                Some(
                    ExtractedEntity::new(EntityType::Year, m.as_str(), 0.9)
                        .with_span(m.start(), m.end())
                        .with_value(EntityValue::Number(year)),
                )
            })
            .collect()
    }

    fn extract_dictionary(
        &self,
        utterance: &str,
        entries: &[autolot_config::DictionaryEntry],
        entity_type: EntityType,
    ) -> Vec<ExtractedEntity> {
        let lower = utterance.to_lowercase();
        let mut out = Vec::new();
        for entry in entries {
            for (term, is_canonical) in std::iter::once((entry.canonical, true))
                .chain(entry.aliases.iter().map(|a| (*a, false)))
            {
                let term_lower = term.to_lowercase();
                for (start, _) in lower.match_indices(&term_lower) {
                    let end = start + term_lower.len();
                    if !has_word_boundaries(&lower, start, end) {
                        continue;
                    }
                    // Synonym folding: an alias still resolves to the
                    // canonical value but carries a small confidence penalty.
                    let confidence = if is_canonical { 0.9 } else { 0.8 };
                    out.push(
                        ExtractedEntity::new(entity_type, &utterance[start..end], confidence)
                            .with_span(start, end)
                            .with_value(EntityValue::Text(entry.canonical.to_string())),
                    );
                }
            }
        }
        out
    }

    fn extract_fuzzy_make(&self, utterance: &str, existing: &[ExtractedEntity]) -> Vec<ExtractedEntity> {
        let candidates: Vec<&'static str> = self.vocabulary.makes.iter().map(|e| e.canonical).collect();
        let mut out = Vec::new();
        for (start, end) in word_spans(utterance) {
            let word = &utterance[start..end];
            if word.chars().count() < 3 {
                continue;
            }
            if existing.iter().any(|e| e.overlaps(&ExtractedEntity::new(EntityType::Make, "", 0.0).with_span(start, end))) {
                continue;
            }
            if let Some(m) = best_fuzzy_match(word, &candidates) {
                out.push(
                    ExtractedEntity::new(EntityType::Make, word, m.confidence)
                        .with_span(start, end)
                        .with_value(EntityValue::Text(m.candidate.to_string())),
                );
            }
        }
        out
    }
}

fn has_word_boundaries(haystack: &str, start: usize, end: usize) -> bool {
    let before_ok = haystack[..start]
        .chars()
        .next_back()
        .map(|c| !c.is_alphanumeric())
        .unwrap_or(true);
    let after_ok = haystack[end..]
        .chars()
        .next()
        .map(|c| !c.is_alphanumeric())
        .unwrap_or(true);
    before_ok && after_ok
}

fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            spans.push((s, i));
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// Keep the highest-confidence entity per contested character span, and
/// collapse duplicate (type, canonical value) pairs to their best instance.
fn resolve_overlaps(mut candidates: Vec<ExtractedEntity>) -> Vec<ExtractedEntity> {
    candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

    let mut kept: Vec<ExtractedEntity> = Vec::new();
    for candidate in candidates {
        let overlaps_kept = kept.iter().any(|k| k.overlaps(&candidate));
        if overlaps_kept {
            continue;
        }
        let duplicate = kept
            .iter()
            .any(|k| k.entity_type == candidate.entity_type && k.value == candidate.value);
        if duplicate {
            continue;
        }
        kept.push(candidate);
    }
    kept.sort_by_key(|e| e.start);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new(PatternConfig::default(), VocabularyConfig::default())
    }

    #[test]
    fn extracts_make_from_dictionary() {
        let entities = extractor().extract("show me a BMW");
        assert!(entities.iter().any(|e| e.entity_type == EntityType::Make
            && e.value == EntityValue::Text("BMW".to_string())));
    }

    #[test]
    fn extracts_price_with_under_operator_hint() {
        let entities = extractor().extract("a car under £20,000");
        let price = entities.iter().find(|e| e.entity_type == EntityType::Price).unwrap();
        assert_eq!(price.operator_hint, Some(Operator::Le));
        assert_eq!(price.value, EntityValue::Number(20000.0));
    }

    #[test]
    fn extracts_price_range_between() {
        let entities = extractor().extract("between £10,000 and £15,000");
        let range = entities.iter().find(|e| e.entity_type == EntityType::PriceRange).unwrap();
        assert_eq!(range.value, EntityValue::Range(10000.0, 15000.0));
    }

    #[test]
    fn low_mileage_gets_marker_value() {
        let entities = extractor().extract("low mileage hatchback");
        let mileage = entities.iter().find(|e| e.entity_type == EntityType::Mileage).unwrap();
        assert_eq!(mileage.value, EntityValue::Number(30_000.0));
        assert_eq!(mileage.operator_hint, Some(Operator::Le));
    }

    #[test]
    fn extracts_year() {
        let entities = extractor().extract("a 2022 BMW 320d automatic");
        assert!(entities
            .iter()
            .any(|e| e.entity_type == EntityType::Year && e.value == EntityValue::Number(2022.0)));
    }

    #[test]
    fn synonym_folds_to_canonical_with_penalty() {
        let entities = extractor().extract("looking for a beamer");
        let make = entities.iter().find(|e| e.entity_type == EntityType::Make).unwrap();
        assert_eq!(make.value, EntityValue::Text("BMW".to_string()));
        assert!(make.confidence < 0.9);
    }

    #[test]
    fn fuzzy_matches_misspelled_make() {
        let entities = extractor().extract("looking for a toyoat");
        let make = entities.iter().find(|e| e.entity_type == EntityType::Make).unwrap();
        assert_eq!(make.value, EntityValue::Text("Toyota".to_string()));
    }

    #[test]
    fn overlap_resolution_keeps_highest_confidence() {
        // "merc" is both an alias for Mercedes-Benz (high confidence) and
        // could tempt a fuzzy match; dictionary lookup should win outright.
        let entities = extractor().extract("a merc estate");
        let makes: Vec<_> = entities.iter().filter(|e| e.entity_type == EntityType::Make).collect();
        assert_eq!(makes.len(), 1);
        assert_eq!(makes[0].value, EntityValue::Text("Mercedes-Benz".to_string()));
    }
}
