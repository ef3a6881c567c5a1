//! Conversation session state. Owned exclusively by the session service in
//! `autolot-query`; every other component receives it by reference.

use crate::constraint::SearchConstraint;
use crate::strategy::SearchStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub applied_constraints: Option<Vec<SearchConstraint>>,
    pub result_count: Option<usize>,
    pub top_ids: Option<Vec<String>>,
}

/// A reference point for "cheaper ones" / "lower mileage" style follow-ups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastResultRef {
    pub id: String,
    pub price: f64,
    pub mileage: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchState {
    /// At most one constraint per field; last-write-wins.
    pub active_filters: HashMap<String, SearchConstraint>,
    pub last_results: Vec<LastResultRef>,
    pub last_strategy: Option<SearchStrategy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub messages: Vec<ConversationMessage>,
    pub current_search_state: SearchState,
    pub metadata: HashMap<String, String>,
}

impl ConversationSession {
    pub fn new(session_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            created_at: now,
            last_accessed_at: now,
            messages: Vec::new(),
            current_search_state: SearchState::default(),
            metadata: HashMap::new(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        now - self.last_accessed_at > timeout
    }

    /// Evicts the oldest message if appending would exceed `max_messages`.
    pub fn append_message(&mut self, message: ConversationMessage, max_messages: usize) {
        if self.messages.len() >= max_messages && !self.messages.is_empty() {
            self.messages.remove(0);
        }
        self.messages.push(message);
    }

    pub fn history(&self, max_messages: usize) -> Vec<ConversationMessage> {
        let len = self.messages.len();
        let start = len.saturating_sub(max_messages);
        self.messages[start..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(content: &str) -> ConversationMessage {
        ConversationMessage {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.to_string(),
            timestamp: Utc::now(),
            applied_constraints: None,
            result_count: None,
            top_ids: None,
        }
    }

    #[test]
    fn append_message_evicts_oldest_at_cap() {
        let mut session = ConversationSession::new("s1", Utc::now());
        for i in 0..3 {
            session.append_message(msg(&i.to_string()), 2);
        }
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].content, "1");
        assert_eq!(session.messages[1].content, "2");
    }

    #[test]
    fn history_returns_newest_n_oldest_first() {
        let mut session = ConversationSession::new("s1", Utc::now());
        for i in 0..5 {
            session.append_message(msg(&i.to_string()), 100);
        }
        let h = session.history(2);
        assert_eq!(h.iter().map(|m| m.content.clone()).collect::<Vec<_>>(), vec!["3", "4"]);
    }

    #[test]
    fn is_expired_respects_timeout() {
        let created = Utc::now() - chrono::Duration::hours(5);
        let mut session = ConversationSession::new("s1", created);
        session.last_accessed_at = created;
        assert!(session.is_expired(Utc::now(), chrono::Duration::hours(4)));
        assert!(!session.is_expired(Utc::now(), chrono::Duration::hours(6)));
    }
}
