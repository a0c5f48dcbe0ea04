//! Per-session cancellation of in-flight turns.
//!
//! Each running turn registers a token under its session id. The stop
//! endpoint cancels it; the agent loop races every model call and tool
//! batch against the token and unwinds with `RunError::Cancelled`.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

pub type CancelToken = CancellationToken;

/// Active cancellation tokens keyed by session id.
pub struct CancelMap {
    tokens: Mutex<HashMap<String, CancelToken>>,
}

impl Default for CancelMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelMap {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Create and register a fresh token for a session's turn.
    pub fn register(&self, session_id: &str) -> CancelToken {
        let token = CancelToken::new();
        self.tokens
            .lock()
            .insert(session_id.to_owned(), token.clone());
        token
    }

    /// Cancel the running turn. Returns true if one was found.
    pub fn cancel(&self, session_id: &str) -> bool {
        match self.tokens.lock().get(session_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Forget the token once the turn completes.
    pub fn remove(&self, session_id: &str) {
        self.tokens.lock().remove(session_id);
    }

    pub fn is_running(&self, session_id: &str) -> bool {
        self.tokens.lock().contains_key(session_id)
    }
}

/// Removes the session's token when dropped, including on early return.
pub struct CancelGuard<'a> {
    map: &'a CancelMap,
    session_id: String,
    pub token: CancelToken,
}

impl<'a> CancelGuard<'a> {
    pub fn register(map: &'a CancelMap, session_id: &str) -> Self {
        Self {
            token: map.register(session_id),
            map,
            session_id: session_id.to_owned(),
        }
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.session_id);
    }
}
