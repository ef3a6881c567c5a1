//! HTTP-backed `LLMClassifier` (spec.md §4.2): an optional fallback the
//! Understanding stage calls when the pattern-based classifier's confidence
//! falls below threshold. The core degrades to pattern matching alone when
//! this is absent or failing, so failures here are never fatal to the caller.

use async_trait::async_trait;
use autolot_config::LlmConfig;
use autolot_core::{ClassifiedIntent, Error, IntentClassification, LLMClassifier, Result};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You classify a car-shopping assistant's incoming message into exactly one \
of: Search, Refine, Compare, Information, OffTopic. Search starts a new vehicle search. Refine narrows \
or changes an existing search in context. Compare asks to compare specific vehicles already shown. \
Information asks a factual question unrelated to searching. OffTopic is unrelated to vehicles entirely. \
Respond with strict JSON: {\"intent\": \"<one of the five>\", \"confidence\": <0.0-1.0>}.";

pub struct HttpLlmClassifier {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpLlmClassifier {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builds with default TLS backend");
        Self { client, config }
    }

    fn request_body(&self, text: &str, previous_text: Option<&str>) -> ChatRequest {
        let mut messages = vec![ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() }];
        if let Some(previous) = previous_text {
            messages.push(ChatMessage { role: "user", content: format!("Previous message: {previous}") });
        }
        messages.push(ChatMessage { role: "user", content: text.to_string() });

        ChatRequest { model: self.config.chat_deployment.clone(), messages, temperature: 0.0 }
    }

    async fn call_once(&self, body: &ChatRequest) -> Result<IntentClassification> {
        let mut request = self.client.post(&self.config.endpoint).json(body);
        if let Some(key) = &self.config.key {
            request = request.header("authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::TransientDependency(format!("LLM classification request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::TransientDependency(format!("LLM classifier returned {}", response.status())));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::PermanentDependency(format!("unparseable LLM classifier response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::PermanentDependency("LLM classifier returned no choices".to_string()))?;

        let verdict: ClassificationVerdict = serde_json::from_str(content.trim())
            .map_err(|e| Error::PermanentDependency(format!("LLM classifier produced non-JSON verdict: {e}")))?;

        Ok(IntentClassification { intent: verdict.intent, confidence: verdict.confidence.clamp(0.0, 1.0) })
    }
}

#[async_trait]
impl LLMClassifier for HttpLlmClassifier {
    async fn classify(&self, text: &str, previous_text: Option<&str>) -> Result<IntentClassification> {
        let body = self.request_body(text, previous_text);

        let mut backoff = Duration::from_millis(100);
        let mut attempt = 0;
        loop {
            match self.call_once(&body).await {
                Ok(result) => return Ok(result),
                Err(err) if attempt < self.config.max_retries => {
                    tracing::warn!(attempt, error = %err, "LLM classification attempt failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn name(&self) -> &str {
        "http-llm-classifier"
    }
}

#[derive(serde::Serialize)]
struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(serde::Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(serde::Deserialize)]
struct ClassificationVerdict {
    intent: ClassifiedIntent,
    confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_includes_previous_text_as_context() {
        let classifier = HttpLlmClassifier::new(LlmConfig {
            endpoint: "http://localhost/v1/chat/completions".to_string(),
            key: None,
            chat_deployment: None,
            embedding_deployment: None,
            max_concurrent: 1,
            max_retries: 0,
        });
        let body = classifier.request_body("show me something cheaper", Some("BMW 320d under 20000"));
        assert_eq!(body.messages.len(), 3);
        assert!(body.messages[1].content.contains("BMW 320d"));
    }

    #[test]
    fn verdict_json_round_trips_into_classification() {
        let verdict: ClassificationVerdict = serde_json::from_str(r#"{"intent":"Refine","confidence":0.82}"#).unwrap();
        assert_eq!(verdict.intent, ClassifiedIntent::Refine);
        assert!((verdict.confidence - 0.82).abs() < 1e-9);
    }
}
