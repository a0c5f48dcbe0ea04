//! Shared fixtures: a scripted model, a canned web search and a wired
//! `AppState` over a small venue index.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

use tg_domain::config::Config;
use tg_domain::error::{Error, Result};
use tg_domain::tool::ToolCall;
use tg_domain::usage::Usage;
use tg_gateway::bootstrap::assemble_state;
use tg_gateway::runtime::GuideRequest;
use tg_gateway::search::{SearchResult, WebSearchProvider};
use tg_gateway::state::AppState;
use tg_knowledge::KnowledgeIndex;
use tg_providers::{ChatRequest, ChatResponse, LlmProvider};
use tg_sessions::{ConversationArchive, ManualClock};

pub const VENUE: &str = r#"{
    "meta": {"version": "1", "scope": "the Luxembourg Garden"},
    "entries": [
        {"id": "medici-fountain", "name": "Medici Fountain",
         "summary": "A baroque fountain built around 1630 for Marie de' Medici.",
         "details": "The grotto shows Polyphemus surprising Acis and Galatea.",
         "tags": ["fountain", "baroque"]},
        {"id": "senate", "name": "Luxembourg Palace",
         "summary": "Seat of the French Senate since 1958.",
         "tags": ["palace", "senate"]},
        {"id": "orchard", "name": "Conservatory Orchard",
         "summary": "Historic orchard with hundreds of apple and pear varieties.",
         "tags": ["garden", "fruit"]}
    ]
}"#;

// ── Scripted model ────────────────────────────────────────────────

pub enum Step {
    Reply(ChatResponse),
    Delayed(Duration, ChatResponse),
    Fail(String),
    /// Never answers; only cancellation ends the call.
    Hang,
}

pub fn text(content: &str, tokens: u32) -> Step {
    Step::Reply(ChatResponse {
        content: content.into(),
        usage: Some(usage(tokens)),
        model: "scripted".into(),
        finish_reason: Some("stop".into()),
        ..Default::default()
    })
}

pub fn tool(name: &str, args: Value, tokens: u32) -> Step {
    Step::Reply(ChatResponse {
        tool_calls: vec![ToolCall {
            call_id: format!("call_{name}"),
            tool_name: name.into(),
            arguments: args,
        }],
        usage: Some(usage(tokens)),
        model: "scripted".into(),
        finish_reason: Some("tool_calls".into()),
        ..Default::default()
    })
}

pub fn knowledge(query: &str) -> Step {
    tool("knowledge_search", json!({ "query": query }), 100)
}

fn usage(total: u32) -> Usage {
    Usage {
        prompt_tokens: total * 3 / 4,
        completion_tokens: total - total * 3 / 4,
        total_tokens: total,
    }
}

/// Replays a fixed script of model responses and records every request.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().push(req.clone());
        let step = self.script.lock().pop_front();
        match step {
            Some(Step::Reply(resp)) => Ok(resp),
            Some(Step::Delayed(delay, resp)) => {
                tokio::time::sleep(delay).await;
                Ok(resp)
            }
            Some(Step::Fail(msg)) => Err(Error::Provider {
                provider: "scripted".into(),
                message: msg,
            }),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(Error::Provider {
                provider: "scripted".into(),
                message: "script exhausted".into(),
            }),
        }
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted"
    }
}

// ── Canned web search ─────────────────────────────────────────────

#[derive(Default)]
pub struct CannedSearch {
    queries: Mutex<Vec<String>>,
}

impl CannedSearch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl WebSearchProvider for CannedSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        self.queries.lock().push(query.to_owned());
        Ok(vec![SearchResult {
            title: format!("About {query}"),
            url: "https://example.org/result".into(),
            snippet: "A result from the public web.".into(),
        }]
        .into_iter()
        .take(max_results)
        .collect())
    }

    fn name(&self) -> &str {
        "canned"
    }
}

// ── Harness ───────────────────────────────────────────────────────

pub struct Harness {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub provider: Arc<ScriptedProvider>,
    pub search: Arc<CannedSearch>,
    _dir: tempfile::TempDir,
}

pub struct HarnessBuilder {
    config: Config,
    steps: Vec<Step>,
    with_search: bool,
}

pub fn harness(steps: Vec<Step>) -> HarnessBuilder {
    HarnessBuilder {
        config: Config::default(),
        steps,
        with_search: true,
    }
}

impl HarnessBuilder {
    pub fn config(mut self, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn without_search(mut self) -> Self {
        self.with_search = false;
        self
    }

    pub async fn build(mut self) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        self.config.archive.path = dir.path().join("conversations.json");
        self.config.archive.notes_path = dir.path().join("notes.json");

        let archive = ConversationArchive::open(&self.config.archive).await.unwrap();
        let knowledge = KnowledgeIndex::from_json(VENUE).unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap(),
        ));
        let provider = ScriptedProvider::new(self.steps);
        let search = CannedSearch::new();

        let state = assemble_state(
            Arc::new(self.config),
            knowledge,
            archive,
            Some(provider.clone() as Arc<dyn LlmProvider>),
            self.with_search
                .then(|| search.clone() as Arc<dyn WebSearchProvider>),
            clock.clone(),
        );

        Harness {
            state,
            clock,
            provider,
            search,
            _dir: dir,
        }
    }
}

pub fn ask(session_id: Option<&str>, text: &str) -> GuideRequest {
    GuideRequest {
        session_id: session_id.map(str::to_owned),
        text: text.into(),
        ..Default::default()
    }
}
