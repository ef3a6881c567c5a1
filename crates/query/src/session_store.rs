//! Session service (spec.md §4.5): the only component allowed to mutate
//! `ConversationSession` state. Sessions are held behind a per-session lock
//! so distinct sessions proceed in parallel while operations against the
//! same session serialize.

use crate::error::{QueryError, Result};
use autolot_core::{ConversationMessage, ConversationSession, SearchState};
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<ConversationSession>>>>,
    timeout: Duration,
    max_messages: usize,
}

impl SessionStore {
    pub fn new(timeout: Duration, max_messages: usize) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), timeout, max_messages }
    }

    pub fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let session = ConversationSession::new(id.clone(), Utc::now());
        self.sessions.write().insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    pub fn get(&self, session_id: &str) -> Result<ConversationSession> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock();
        self.expire_if_stale(session_id, &mut session)?;
        session.last_accessed_at = Utc::now();
        Ok(session.clone())
    }

    pub fn exists(&self, session_id: &str) -> bool {
        self.get(session_id).is_ok()
    }

    pub fn append_message(&self, session_id: &str, message: ConversationMessage) -> Result<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock();
        self.expire_if_stale(session_id, &mut session)?;
        session.append_message(message, self.max_messages);
        session.last_accessed_at = Utc::now();
        Ok(())
    }

    pub fn update_search_state(&self, session_id: &str, state: SearchState) -> Result<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock();
        self.expire_if_stale(session_id, &mut session)?;
        session.current_search_state = state;
        session.last_accessed_at = Utc::now();
        Ok(())
    }

    pub fn history(&self, session_id: &str, max_messages: usize) -> Result<Vec<ConversationMessage>> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock();
        self.expire_if_stale(session_id, &mut session)?;
        Ok(session.history(max_messages))
    }

    pub fn clear(&self, session_id: &str) {
        self.sessions.write().remove(session_id);
    }

    /// Removes every session whose `last_accessed_at` has exceeded the
    /// configured timeout. Called periodically by the server's background
    /// sweeper (spec.md §5).
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let timeout = self.timeout;
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, handle| !handle.lock().is_expired(now, timeout));
        before - sessions.len()
    }

    fn handle(&self, session_id: &str) -> Result<Arc<Mutex<ConversationSession>>> {
        self.sessions.read().get(session_id).cloned().ok_or(QueryError::SessionNotFound)
    }

    fn expire_if_stale(&self, session_id: &str, session: &mut ConversationSession) -> Result<()> {
        if session.is_expired(Utc::now(), self.timeout) {
            self.sessions.write().remove(session_id);
            return Err(QueryError::SessionNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_core::Role;

    fn store() -> SessionStore {
        SessionStore::new(Duration::hours(4), 50)
    }

    fn message(content: &str) -> ConversationMessage {
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
    fn create_then_get_round_trips() {
        let store = store();
        let id = store.create();
        let session = store.get(&id).unwrap();
        assert_eq!(session.session_id, id);
    }

    #[test]
    fn get_unknown_session_errors() {
        let store = store();
        assert!(matches!(store.get("missing"), Err(QueryError::SessionNotFound)));
    }

    #[test]
    fn append_message_persists_across_gets() {
        let store = store();
        let id = store.create();
        store.append_message(&id, message("hello")).unwrap();
        let session = store.get(&id).unwrap();
        assert_eq!(session.messages.len(), 1);
    }

    #[test]
    fn clear_removes_the_session() {
        let store = store();
        let id = store.create();
        store.clear(&id);
        assert!(!store.exists(&id));
    }

    #[test]
    fn sweep_evicts_only_expired_sessions() {
        let store = SessionStore::new(Duration::seconds(-1), 50);
        let id = store.create();
        assert_eq!(store.sweep(), 1);
        assert!(!store.exists(&id));
    }

    #[test]
    fn distinct_sessions_do_not_block_each_other() {
        let store = Arc::new(store());
        let a = store.create();
        let b = store.create();
        let store_a = store.clone();
        let handle = std::thread::spawn(move || {
            store_a.append_message(&a, message("from a")).unwrap();
        });
        store.append_message(&b, message("from b")).unwrap();
        handle.join().unwrap();
    }
}
