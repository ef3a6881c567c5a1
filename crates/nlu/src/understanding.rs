//! Orchestrates the Understanding stage: classify intent (LLM-primary,
//! pattern-fallback) and extract entities, composed into a `ParsedQuery`.

use crate::entity::EntityExtractor;
use crate::intent::PatternIntentClassifier;
use autolot_core::{ClassifiedIntent, IntentClassification, LLMClassifier, ParsedQuery};
use std::sync::Arc;

pub struct Understanding {
    llm_classifier: Option<Arc<dyn LLMClassifier>>,
    pattern_classifier: PatternIntentClassifier,
    extractor: EntityExtractor,
}

impl Understanding {
    pub fn new(
        llm_classifier: Option<Arc<dyn LLMClassifier>>,
        patterns: autolot_config::PatternConfig,
        vocabulary: autolot_config::VocabularyConfig,
    ) -> Self {
        Self {
            pattern_classifier: PatternIntentClassifier::new(&vocabulary),
            extractor: EntityExtractor::new(patterns, vocabulary),
            llm_classifier,
        }
    }

    pub async fn understand(&self, utterance: &str, previous_utterance: Option<&str>) -> ParsedQuery {
        let classification = self.classify(utterance, previous_utterance).await;
        let entities = self.extractor.extract(utterance);

        let mut parsed = ParsedQuery::new(utterance, classification.intent, classification.confidence);
        parsed.entities = entities;
        parsed
    }

    async fn classify(&self, utterance: &str, previous_utterance: Option<&str>) -> IntentClassification {
        if let Some(classifier) = &self.llm_classifier {
            match classifier.classify(utterance, previous_utterance).await {
                Ok(classification) => return classification,
                Err(err) => {
                    tracing::warn!(error = %err, "LLM intent classification failed, falling back to patterns");
                }
            }
        }
        self.pattern_classifier.classify(utterance, previous_utterance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_config::{PatternConfig, VocabularyConfig};

    fn understanding() -> Understanding {
        Understanding::new(None, PatternConfig::default(), VocabularyConfig::default())
    }

    #[tokio::test]
    async fn falls_back_to_pattern_classifier_without_llm() {
        let parsed = understanding().understand("show me a BMW under £20,000", None).await;
        assert_eq!(parsed.intent, ClassifiedIntent::Search);
        assert!(!parsed.entities.is_empty());
    }

    #[tokio::test]
    async fn off_topic_utterance_classified_without_entities_of_interest() {
        let parsed = understanding().understand("tell me a joke", None).await;
        assert_eq!(parsed.intent, ClassifiedIntent::OffTopic);
    }
}
