use std::sync::Arc;

use tg_domain::config::Config;
use tg_knowledge::KnowledgeIndex;
use tg_sessions::{ConversationArchive, SessionManager, WakeMatcher};

use crate::runtime::cancel::CancelMap;
use crate::runtime::orchestrator::Orchestrator;
use crate::runtime::session_lock::SessionLockMap;

/// Shared application state passed to all API handlers.
///
/// Fields are grouped by concern:
/// - **Core services**: config, knowledge index, orchestrator
/// - **Session management**: sessions, archive, wake matcher
/// - **Runtime**: per-session locks and cancellation
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub knowledge: Arc<KnowledgeIndex>,
    /// `None` when no model endpoint is configured; `/v1/guide` then
    /// answers 503.
    pub orchestrator: Option<Arc<Orchestrator>>,
    /// Why the orchestrator is missing, for the health endpoint.
    pub llm_error: Option<String>,

    // ── Session management ────────────────────────────────────────────
    pub sessions: Arc<SessionManager>,
    pub archive: Arc<ConversationArchive>,
    pub wake: Arc<WakeMatcher>,

    // ── Runtime ───────────────────────────────────────────────────────
    pub session_locks: Arc<SessionLockMap>,
    pub cancel_map: Arc<CancelMap>,
}
