//! One guide turn end to end: validate the utterance, resolve and lock the
//! session, check expiry and the wake phrase, orchestrate, then record.
//!
//! Session and archive mutations happen only after the orchestrator
//! returns an answer; every other outcome leaves stored state untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tg_domain::tool::Message;
use tg_sessions::{is_valid_session_id, ConversationRecord, Session, WakeMatcher};

use super::cancel::CancelGuard;
use super::orchestrator::{Answer, TurnOutcome, TurnRequest};
use super::prompt::PromptContext;
use crate::state::AppState;

pub const END_IDLE_TIMEOUT: &str = "idle_timeout";
pub const END_MAX_TURNS: &str = "max_turns";
pub const END_BY_CLIENT: &str = "ended_by_client";

const IDLE_REPLY: &str =
    "Our session ended after a period of quiet. Say the wake phrase to start again.";
const WAKE_ONLY_REPLY: &str = "I'm listening. What would you like to know?";
const FAREWELL_SUFFIX: &str = " That's all the questions I can take this session. Enjoy your visit!";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub stripped_text: Option<String>,
    #[serde(default)]
    pub wake_word_detected: Option<bool>,
    #[serde(default)]
    pub wake_word: Option<String>,
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideResponse {
    pub session_id: String,
    pub reply: String,
    pub ended: bool,
    pub end_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub meta: GuideMeta,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideMeta {
    pub turn: u32,
    pub last_seen_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub detected_wake_word: bool,
    pub knowledge_references: Vec<String>,
    pub used_web_search: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_search_note: Option<String>,
    /// Orchestrator outcome kind (`answered`, `budget_exceeded`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
}

/// A request the client must correct. Wake-phrase rejections still carry
/// a full response so the client learns its session id.
#[derive(Debug)]
pub enum GuideError {
    EmptyInput,
    WakeWordRequired(Box<GuideResponse>),
    EmptyQuestion(Box<GuideResponse>),
    ModelUnavailable(String),
    Busy,
}

impl GuideError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::WakeWordRequired(_) => "wake_word_required",
            Self::EmptyQuestion(_) => "empty_question",
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::Busy => "session_busy",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn run_guide_turn(state: &AppState, req: GuideRequest) -> Result<GuideResponse, GuideError> {
    let text = req.text.trim();
    let client_stripped = req.stripped_text.as_deref().map(str::trim).unwrap_or("");
    if text.is_empty() && client_stripped.is_empty() {
        return Err(GuideError::EmptyInput);
    }

    let orchestrator = match &state.orchestrator {
        Some(o) => o.clone(),
        None => {
            return Err(GuideError::ModelUnavailable(
                state
                    .llm_error
                    .clone()
                    .unwrap_or_else(|| "no model endpoint configured".into()),
            ))
        }
    };

    // Generated ids are unknown to every other caller, so only a
    // client-supplied id needs the lock.
    let lock_key = req
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| is_valid_session_id(id));
    let _permit = match lock_key {
        Some(id) => Some(
            state
                .session_locks
                .acquire(id)
                .await
                .map_err(|_| GuideError::Busy)?,
        ),
        None => None,
    };

    let resolved = state.sessions.get_session(req.session_id.as_deref());
    let is_new = resolved.is_new;
    let mut session = resolved.session;

    if !is_new && state.sessions.is_expired(&session) {
        state.sessions.expire(&session);
        return Ok(GuideResponse {
            session_id: session.id.clone(),
            reply: IDLE_REPLY.into(),
            ended: true,
            end_reason: Some(END_IDLE_TIMEOUT.into()),
            error: None,
            meta: base_meta(state, &session, false),
        });
    }

    // ── Wake phrase ──────────────────────────────────────────────────
    let custom_phrase = req.wake_word.as_deref().map(str::trim).filter(|w| !w.is_empty());
    let wake = match custom_phrase {
        Some(phrase) => WakeMatcher::new(phrase).detect_and_strip(text),
        None => state.wake.detect_and_strip(text),
    };
    let detected = req.wake_word_detected.unwrap_or(false) || wake.matched;
    let utterance = if client_stripped.is_empty() {
        wake.stripped.clone()
    } else {
        client_stripped.to_owned()
    };

    if session.is_fresh() && state.config.wake.required_on_first_turn && !detected {
        let reply = format!(
            "Please start by saying \"{}\" followed by your question.",
            wake.wake_phrase
        );
        if is_new {
            state.sessions.discard(&session);
        }
        return Err(GuideError::WakeWordRequired(Box::new(rejection(
            state,
            &session,
            reply,
            "wake_word_required",
            false,
        ))));
    }
    if utterance.is_empty() {
        if is_new {
            state.sessions.discard(&session);
        }
        return Err(GuideError::EmptyQuestion(Box::new(rejection(
            state,
            &session,
            WAKE_ONLY_REPLY.into(),
            "empty_question",
            detected,
        ))));
    }

    state.sessions.set_lang(&mut session, req.lang.as_deref());

    // ── Orchestrate ──────────────────────────────────────────────────
    let turn_req = TurnRequest {
        utterance: utterance.clone(),
        history: context_history(state, &session),
        notes: state
            .archive
            .notes(&session.id)
            .into_iter()
            .map(|n| n.text)
            .collect(),
        context: PromptContext {
            place_name: req.place_name.clone(),
            lat: req.lat,
            lng: req.lng,
            lang: session.lang.clone(),
            venue_scope: state.knowledge.meta().scope.clone(),
        },
    };

    let outcome = {
        let guard = CancelGuard::register(&state.cancel_map, &session.id);
        orchestrator.orchestrate(&turn_req, &guard.token).await
    };

    match outcome {
        TurnOutcome::Answered(answer) => {
            Ok(record_answer(state, session, &utterance, answer, detected).await)
        }
        other => {
            tracing::info!(
                session_id = %session.id,
                outcome = other.kind(),
                "turn finished without an answer"
            );
            let mut meta = base_meta(state, &session, detected);
            meta.outcome = Some(other.kind());
            Ok(GuideResponse {
                session_id: session.id.clone(),
                reply: other.reply().to_owned(),
                ended: false,
                end_reason: None,
                error: None,
                meta,
            })
        }
    }
}

async fn record_answer(
    state: &AppState,
    session: Session,
    utterance: &str,
    answer: Answer,
    detected: bool,
) -> GuideResponse {
    let recorded = state.sessions.record_turn(session, utterance, &answer.text);
    let session = recorded.session;

    let record = ConversationRecord {
        user: utterance.to_owned(),
        assistant: answer.text.clone(),
        timestamp: session.last_seen_at,
        session_id: session.id.clone(),
    };
    if let Err(e) = state.archive.append(record).await {
        tracing::warn!(session_id = %session.id, error = %e, "archive append failed");
    }

    let mut reply = answer.text;
    if recorded.ended {
        reply.push_str(FAREWELL_SUFFIX);
    }

    let mut meta = base_meta(state, &session, detected);
    meta.knowledge_references = answer.knowledge_references;
    meta.used_web_search = answer.used_web_search;
    meta.web_search_note = answer.web_search_note;
    meta.outcome = Some("answered");

    GuideResponse {
        session_id: session.id,
        reply,
        ended: recorded.ended,
        end_reason: recorded.ended.then(|| END_MAX_TURNS.to_owned()),
        error: None,
        meta,
    }
}

/// Prior exchanges for the prompt: the live session's window, or, for a
/// session with no messages yet, the most recent archived records.
fn context_history(state: &AppState, session: &Session) -> Vec<Message> {
    let live = session.history(state.sessions.history_window());
    if !live.is_empty() {
        return live.iter().map(|m| m.to_message()).collect();
    }

    let limit = state.config.archive.context_records;
    let mut records = state.archive.recent(&session.id, limit);
    records.reverse();
    records
        .into_iter()
        .flat_map(|r| [Message::user(r.user), Message::assistant(r.assistant)])
        .collect()
}

fn base_meta(state: &AppState, session: &Session, detected: bool) -> GuideMeta {
    GuideMeta {
        turn: session.turns(),
        last_seen_at: session.last_seen_at,
        expires_at: state.sessions.expires_at(session),
        detected_wake_word: detected,
        knowledge_references: Vec::new(),
        used_web_search: false,
        web_search_note: None,
        outcome: None,
    }
}

fn rejection(
    state: &AppState,
    session: &Session,
    reply: String,
    error: &str,
    detected: bool,
) -> GuideResponse {
    GuideResponse {
        session_id: session.id.clone(),
        reply,
        ended: false,
        end_reason: None,
        error: Some(error.to_owned()),
        meta: base_meta(state, session, detected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_camel_case() {
        let req: GuideRequest = serde_json::from_str(
            r#"{"sessionId": null, "text": "hey guide hi", "wakeWordDetected": true,
                "placeName": "Louvre", "lat": 48.86, "lng": 2.33, "lang": "fr"}"#,
        )
        .unwrap();
        assert!(req.session_id.is_none());
        assert_eq!(req.wake_word_detected, Some(true));
        assert_eq!(req.place_name.as_deref(), Some("Louvre"));
    }

    #[test]
    fn response_serializes_camel_case() {
        let now = Utc::now();
        let resp = GuideResponse {
            session_id: "s1".into(),
            reply: "Hi".into(),
            ended: false,
            end_reason: None,
            error: None,
            meta: GuideMeta {
                turn: 1,
                last_seen_at: now,
                expires_at: now,
                detected_wake_word: true,
                knowledge_references: vec!["fountain".into()],
                used_web_search: false,
                web_search_note: None,
                outcome: Some("answered"),
            },
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["sessionId"], "s1");
        assert!(v["endReason"].is_null());
        assert!(v.get("error").is_none());
        assert_eq!(v["meta"]["knowledgeReferences"][0], "fountain");
        assert_eq!(v["meta"]["detectedWakeWord"], true);
        assert!(v["meta"].get("webSearchNote").is_none());
    }
}
