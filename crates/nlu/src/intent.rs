//! Pattern-based intent classification fallback.
//!
//! The primary path is an injected `LLMClassifier`; this module is what
//! runs when no classifier is configured or the call fails. Results are
//! cached by `(utterance, previous_utterance)` since the same turn is often
//! re-classified (e.g. a retry after a transient search failure).

use autolot_core::{ClassifiedIntent, IntentClassification};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;

struct IntentPattern {
    intent: ClassifiedIntent,
    regex: Regex,
    confidence: f64,
}

static PATTERNS: Lazy<Vec<IntentPattern>> = Lazy::new(|| {
    vec![
        IntentPattern {
            intent: ClassifiedIntent::Compare,
            regex: Regex::new(r"(?i)\b(compare|versus|vs\.?|which (?:one|is) (?:better|cheaper)|difference between)\b").unwrap(),
            confidence: 0.8,
        },
        IntentPattern {
            intent: ClassifiedIntent::Refine,
            regex: Regex::new(
                r"(?i)\b(instead|actually|change (?:it|that)|narrow (?:it|that) down|cheaper than that|more expensive|newer|older|fewer miles|lower mileage|under my budget|not that one|something else)\b",
            )
            .unwrap(),
            confidence: 0.75,
        },
        IntentPattern {
            intent: ClassifiedIntent::Information,
            regex: Regex::new(
                r"(?i)\b(what is|what's|tell me about|explain|how does|mot\b|warranty|finance options?|part exchange|service history)\b",
            )
            .unwrap(),
            confidence: 0.7,
        },
    ]
});

/// Cache key: the current utterance paired with the previous turn's
/// utterance, since classification can depend on context (e.g. "cheaper"
/// only makes sense as Refine after a prior Search).
type CacheKey = (String, Option<String>);

/// Cache capacity (distinct `(utterance, previous_utterance)` pairs) before
/// the cache is cleared and rebuilt from scratch — same bounded-cache idiom
/// as `search::embeddings::CachingEmbedder`.
const CACHE_CAPACITY: usize = 1_000;

pub struct PatternIntentClassifier {
    vehicle_lexemes: Vec<&'static str>,
    cache: Mutex<HashMap<CacheKey, IntentClassification>>,
}

impl PatternIntentClassifier {
    pub fn new(vocabulary: &autolot_config::VocabularyConfig) -> Self {
        Self {
            vehicle_lexemes: vocabulary.vehicle_lexemes.clone(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn classify(&self, utterance: &str, previous_utterance: Option<&str>) -> IntentClassification {
        let key: CacheKey = (utterance.to_string(), previous_utterance.map(str::to_string));
        if let Some(cached) = self.cache.lock().get(&key) {
            return cached.clone();
        }

        let result = self.classify_uncached(utterance);

        let mut cache = self.cache.lock();
        if cache.len() >= CACHE_CAPACITY {
            cache.clear();
        }
        cache.insert(key, result.clone());

        result
    }

    fn classify_uncached(&self, utterance: &str) -> IntentClassification {
        for pattern in PATTERNS.iter() {
            if pattern.regex.is_match(utterance) {
                return IntentClassification { intent: pattern.intent, confidence: pattern.confidence };
            }
        }

        let lower = utterance.to_lowercase();
        if self.vehicle_lexemes.iter().any(|l| lower.contains(l)) {
            IntentClassification { intent: ClassifiedIntent::Search, confidence: 0.6 }
        } else {
            IntentClassification { intent: ClassifiedIntent::OffTopic, confidence: 0.8 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_config::VocabularyConfig;

    fn classifier() -> PatternIntentClassifier {
        PatternIntentClassifier::new(&VocabularyConfig::default())
    }

    #[test]
    fn compare_phrase_wins_over_default() {
        let c = classifier();
        let r = c.classify("compare this BMW versus that Audi", None);
        assert_eq!(r.intent, ClassifiedIntent::Compare);
    }

    #[test]
    fn refine_phrase_detected() {
        let c = classifier();
        let r = c.classify("actually show me something cheaper than that", Some("show me a BMW"));
        assert_eq!(r.intent, ClassifiedIntent::Refine);
    }

    #[test]
    fn defaults_to_search_when_vehicle_lexeme_present() {
        let c = classifier();
        let r = c.classify("I want a diesel estate", None);
        assert_eq!(r.intent, ClassifiedIntent::Search);
        assert_eq!(r.confidence, 0.6);
    }

    #[test]
    fn defaults_to_off_topic_without_vehicle_lexeme() {
        let c = classifier();
        let r = c.classify("tell me a joke", None);
        assert_eq!(r.intent, ClassifiedIntent::OffTopic);
        assert_eq!(r.confidence, 0.8);
    }

    #[test]
    fn results_are_cached() {
        let c = classifier();
        let first = c.classify("I want a BMW", None);
        let second = c.classify("I want a BMW", None);
        assert_eq!(first.intent, second.intent);
        assert_eq!(c.cache.lock().len(), 1);
    }

    #[test]
    fn cache_is_bounded_rather_than_growing_unboundedly() {
        let c = classifier();
        for i in 0..CACHE_CAPACITY + 10 {
            c.classify(&format!("I want a BMW number {i}"), None);
        }
        assert!(c.cache.lock().len() <= CACHE_CAPACITY);
    }
}
