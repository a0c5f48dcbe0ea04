//! AppState construction and background-task spawning.
//!
//! [`build_app_state`] is the boot path used by `serve`; tests and
//! embedders that bring their own model or search backend call
//! [`assemble_state`] directly.

use std::sync::Arc;

use anyhow::Context;

use tg_domain::config::{Config, ConfigSeverity};
use tg_knowledge::KnowledgeIndex;
use tg_providers::{LlmProvider, OpenAiCompatProvider};
use tg_sessions::{
    Clock, ConversationArchive, InMemorySessionStore, SessionManager, SystemClock, WakeMatcher,
};

use crate::runtime::cancel::CancelMap;
use crate::runtime::orchestrator::Orchestrator;
use crate::runtime::session_lock::SessionLockMap;
use crate::runtime::tools::GuideTools;
use crate::search::{SearxngSearch, WebSearchProvider};
use crate::state::AppState;

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Knowledge index ──────────────────────────────────────────────
    let index_path = &config.knowledge.index_path;
    let knowledge = if index_path.exists() {
        KnowledgeIndex::load(index_path)
            .with_context(|| format!("loading knowledge index {}", index_path.display()))?
    } else {
        tracing::warn!(
            path = %index_path.display(),
            "knowledge index not found, starting with an empty index"
        );
        KnowledgeIndex::default()
    };

    // ── Conversation archive ─────────────────────────────────────────
    let archive = ConversationArchive::open(&config.archive)
        .await
        .context("opening conversation archive")?;

    // ── Model provider ───────────────────────────────────────────────
    let (provider, llm_error): (Option<Arc<dyn LlmProvider>>, Option<String>) =
        if !config.llm.is_configured() {
            tracing::warn!("no [llm] base_url configured; /v1/guide will answer 503");
            (None, Some("no model endpoint configured".into()))
        } else {
            match OpenAiCompatProvider::from_config(&config.llm) {
                Ok(p) => {
                    tracing::info!(
                        provider = %config.llm.id,
                        model = %config.llm.default_model,
                        "LLM provider ready"
                    );
                    (Some(Arc::new(p)), None)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "LLM provider failed to initialize");
                    (None, Some(e.to_string()))
                }
            }
        };

    // ── Web search ───────────────────────────────────────────────────
    let search: Option<Arc<dyn WebSearchProvider>> = if config.search.enabled {
        match SearxngSearch::from_config(&config.search) {
            Ok(s) => {
                tracing::info!(base_url = %config.search.base_url, "web search ready");
                Some(Arc::new(s))
            }
            Err(e) => {
                tracing::warn!(error = %e, "web search disabled");
                None
            }
        }
    } else {
        tracing::info!("web search disabled by config");
        None
    };

    let mut state = assemble_state(
        config,
        knowledge,
        archive,
        provider,
        search,
        Arc::new(SystemClock),
    );
    if state.orchestrator.is_none() {
        state.llm_error = llm_error;
    }
    Ok(state)
}

/// Wire already-built subsystems into an [`AppState`].
pub fn assemble_state(
    config: Arc<Config>,
    knowledge: KnowledgeIndex,
    archive: ConversationArchive,
    provider: Option<Arc<dyn LlmProvider>>,
    search: Option<Arc<dyn WebSearchProvider>>,
    clock: Arc<dyn Clock>,
) -> AppState {
    let knowledge = Arc::new(knowledge);

    let sessions = Arc::new(SessionManager::new(
        Arc::new(InMemorySessionStore::new()),
        clock,
        &config.sessions,
    ));

    let orchestrator = provider.map(|provider| {
        let tools = GuideTools::new(
            knowledge.clone(),
            config.knowledge.clone(),
            search,
            &config.search,
        );
        Arc::new(Orchestrator::new(
            provider,
            tools,
            config.orchestrator.clone(),
            &config.llm,
        ))
    });
    let llm_error = orchestrator
        .is_none()
        .then(|| "no model endpoint configured".to_owned());

    AppState {
        wake: Arc::new(WakeMatcher::new(&config.wake.phrase)),
        knowledge,
        orchestrator,
        llm_error,
        sessions,
        archive: Arc::new(archive),
        session_locks: Arc::new(SessionLockMap::new()),
        cancel_map: Arc::new(CancelMap::new()),
        config,
    }
}

/// Spawn the long-running background tasks. Call after
/// [`build_app_state`] when running the HTTP server.
pub fn spawn_background_tasks(state: &AppState) {
    // ── Periodic session lock pruning ────────────────────────────────
    let session_locks = state.session_locks.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            session_locks.prune_idle();
        }
    });
}
