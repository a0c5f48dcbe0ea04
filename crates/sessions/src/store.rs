//! Session storage seam.
//!
//! The store is a plain keyed map; expiry and turn policy live in
//! [`crate::lifecycle::SessionManager`]. Swapping the implementation (or
//! wrapping it for tests) never touches the policy.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::session::Session;

pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str) -> Option<Session>;
    fn put(&self, session: Session);
    fn delete(&self, session_id: &str) -> Option<Session>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store. Sessions do not survive a restart; the
/// conversation archive does.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().get(session_id).cloned()
    }

    fn put(&self, session: Session) {
        self.sessions.write().insert(session.id.clone(), session);
    }

    fn delete(&self, session_id: &str) -> Option<Session> {
        self.sessions.write().remove(session_id)
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn put_get_delete() {
        let store = InMemorySessionStore::new();
        assert!(store.is_empty());

        store.put(Session::new("a", Utc::now()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").map(|s| s.id), Some("a".to_string()));

        assert!(store.delete("a").is_some());
        assert!(store.get("a").is_none());
        assert!(store.delete("a").is_none());
    }

    #[test]
    fn get_returns_a_snapshot() {
        let store = InMemorySessionStore::new();
        store.put(Session::new("a", Utc::now()));

        let mut copy = store.get("a").unwrap();
        copy.record_turn("q", "a", Utc::now());
        assert_eq!(store.get("a").unwrap().turns(), 0);
    }
}
