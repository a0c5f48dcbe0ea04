//! Session lifecycle: resolve-or-create, lazy idle expiry, turn ceiling.
//!
//! Expiry is evaluated when a session is accessed, never by a background
//! sweep. An expired session is deleted from the store at that point.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use tg_domain::config::{SessionsConfig, MAX_IDLE_TIMEOUT_MS};
use tg_domain::trace::TraceEvent;

use crate::clock::Clock;
use crate::session::Session;
use crate::store::SessionStore;

const MAX_SESSION_ID_LEN: usize = 128;

/// Whether a client-supplied session id may be adopted as-is.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Out-of-range timeouts are clamped; `Config::validate` reports them.
fn idle_window(ms: u64) -> Duration {
    let ms = i64::try_from(ms.min(MAX_IDLE_TIMEOUT_MS)).unwrap_or(i64::MAX);
    Duration::try_milliseconds(ms).unwrap_or(Duration::MAX)
}

#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session: Session,
    pub is_new: bool,
}

/// Outcome of recording a turn.
#[derive(Debug, Clone)]
pub struct TurnRecorded {
    pub session: Session,
    /// The turn ceiling was reached; the session has been removed.
    pub ended: bool,
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
    max_turns: u32,
    history_window: usize,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        config: &SessionsConfig,
    ) -> Self {
        Self {
            store,
            clock,
            idle_timeout: idle_window(config.idle_timeout_ms),
            max_turns: config.max_turns,
            history_window: config.history_window,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Look up a session without creating one.
    pub fn peek(&self, session_id: &str) -> Option<Session> {
        self.store.get(session_id)
    }

    /// Resolve the session for `session_id`, creating it when absent or
    /// unknown. A well-formed unknown id is adopted so archived history
    /// keyed under it stays reachable; anything else gets a fresh id.
    pub fn get_session(&self, session_id: Option<&str>) -> ResolvedSession {
        let requested = session_id.map(str::trim).filter(|s| !s.is_empty());

        if let Some(id) = requested {
            if let Some(session) = self.store.get(id) {
                TraceEvent::SessionResolved {
                    session_id: id.to_owned(),
                    is_new: false,
                }
                .emit();
                return ResolvedSession {
                    session,
                    is_new: false,
                };
            }
        }

        let id = match requested {
            Some(id) if is_valid_session_id(id) => id.to_owned(),
            Some(id) => {
                tracing::debug!(requested = %id, "rejecting malformed session id");
                uuid::Uuid::new_v4().to_string()
            }
            None => uuid::Uuid::new_v4().to_string(),
        };

        let session = Session::new(id.clone(), self.clock.now());
        self.store.put(session.clone());

        TraceEvent::SessionResolved {
            session_id: id,
            is_new: true,
        }
        .emit();

        ResolvedSession {
            session,
            is_new: true,
        }
    }

    /// `now - last_seen_at > idle window`.
    pub fn is_expired(&self, session: &Session) -> bool {
        self.clock.now() - session.last_seen_at > self.idle_timeout
    }

    pub fn expires_at(&self, session: &Session) -> DateTime<Utc> {
        session
            .last_seen_at
            .checked_add_signed(self.idle_timeout)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Remove an idle session from the store.
    pub fn expire(&self, session: &Session) {
        let idle_ms = (self.clock.now() - session.last_seen_at).num_milliseconds();
        self.store.delete(&session.id);
        TraceEvent::SessionExpired {
            session_id: session.id.clone(),
            idle_ms,
        }
        .emit();
    }

    /// Drop a session created for a request that was turned away before
    /// any exchange. Sessions with history are left alone.
    pub fn discard(&self, session: &Session) {
        if !session.is_fresh() {
            return;
        }
        if self.store.get(&session.id).is_some_and(|s| s.is_fresh()) {
            self.store.delete(&session.id);
            tracing::debug!(session_id = %session.id, "discarded unused session");
        }
    }

    /// Remove a session for any non-idle reason.
    pub fn end(&self, session_id: &str, reason: &str) -> Option<Session> {
        let removed = self.store.delete(session_id)?;
        TraceEvent::SessionEnded {
            session_id: session_id.to_owned(),
            reason: reason.to_owned(),
            turns: removed.turns(),
        }
        .emit();
        Some(removed)
    }

    /// Remember the visitor's locale for later turns.
    pub fn set_lang(&self, session: &mut Session, lang: Option<&str>) {
        if let Some(lang) = lang.map(str::trim).filter(|l| !l.is_empty()) {
            session.lang = Some(lang.to_owned());
        }
    }

    /// Apply one successful exchange and write the session back. Reaching
    /// the turn ceiling removes the session instead.
    pub fn record_turn(
        &self,
        mut session: Session,
        user: &str,
        assistant: &str,
    ) -> TurnRecorded {
        session.record_turn(user, assistant, self.clock.now());

        if session.turns() >= self.max_turns {
            self.store.delete(&session.id);
            TraceEvent::SessionEnded {
                session_id: session.id.clone(),
                reason: "max_turns".into(),
                turns: session.turns(),
            }
            .emit();
            return TurnRecorded {
                session,
                ended: true,
            };
        }

        self.store.put(session.clone());
        TurnRecorded {
            session,
            ended: false,
        }
    }
}
