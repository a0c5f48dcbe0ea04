use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tg_domain::tool::{Message, Role};

/// One side of an exchange, as remembered by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: Role,
    pub content: String,
}

impl SessionMessage {
    pub fn to_message(&self) -> Message {
        match self.role {
            Role::Assistant => Message::assistant(self.content.clone()),
            _ => Message::user(self.content.clone()),
        }
    }
}

/// A visitor's conversational context.
///
/// `turns` always equals `messages.len() / 2`: the only mutator,
/// [`Session::record_turn`], appends exactly one user and one assistant
/// message per turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    messages: Vec<SessionMessage>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    turns: u32,
    #[serde(default)]
    pub lang: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            created_at: now,
            last_seen_at: now,
            turns: 0,
            lang: None,
        }
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn messages(&self) -> &[SessionMessage] {
        &self.messages
    }

    pub fn is_fresh(&self) -> bool {
        self.turns == 0
    }

    /// Record one completed exchange.
    pub fn record_turn(
        &mut self,
        user: impl Into<String>,
        assistant: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.messages.push(SessionMessage {
            role: Role::User,
            content: user.into(),
        });
        self.messages.push(SessionMessage {
            role: Role::Assistant,
            content: assistant.into(),
        });
        self.turns += 1;
        self.last_seen_at = now;
    }

    /// The most recent `window` messages, oldest first. The window is
    /// rounded down to whole exchanges so history never opens on an
    /// assistant reply.
    pub fn history(&self, window: usize) -> &[SessionMessage] {
        let window = window - window % 2;
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_track_message_pairs() {
        let now = Utc::now();
        let mut s = Session::new("s1", now);
        for i in 0..5 {
            s.record_turn(format!("q{i}"), format!("a{i}"), now);
        }
        assert_eq!(s.turns(), 5);
        assert_eq!(s.messages().len(), 10);
        assert!(!s.is_fresh());
    }

    #[test]
    fn history_window_keeps_latest_whole_exchanges() {
        let now = Utc::now();
        let mut s = Session::new("s1", now);
        for i in 0..4 {
            s.record_turn(format!("q{i}"), format!("a{i}"), now);
        }
        let h = s.history(5);
        assert_eq!(h.len(), 4);
        assert_eq!(h[0].content, "q2");
        assert_eq!(h[0].role, Role::User);
        assert_eq!(h[3].content, "a3");

        assert_eq!(s.history(100).len(), 8);
        assert!(s.history(0).is_empty());
    }

    #[test]
    fn record_turn_moves_last_seen() {
        let t0 = Utc::now();
        let mut s = Session::new("s1", t0);
        let t1 = t0 + chrono::Duration::seconds(5);
        s.record_turn("q", "a", t1);
        assert_eq!(s.last_seen_at, t1);
        assert_eq!(s.created_at, t0);
    }
}
