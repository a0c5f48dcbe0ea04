//! One agent run: the model/tool loop that turns a prompt into an answer.
//!
//! The loop calls the model, executes any requested tools, appends their
//! results and repeats until the model answers without tool calls or the
//! turn ceiling is hit. Every model call and tool batch is raced against
//! the turn's cancel token.

use std::sync::Arc;

use tracing::Instrument;

use tg_domain::tool::{Message, ToolCall};
use tg_domain::usage::UsageStats;
use tg_providers::{ChatRequest, LlmProvider};

use super::cancel::CancelToken;
use super::tools::{GuideTools, LookupRecord};

/// Sampling knobs passed through to every model call.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub max_turns: u32,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
}

/// What happened during a run, for escalation and reference reporting.
#[derive(Debug, Clone, Default)]
pub struct AgentRunTrace {
    pub lookups: Vec<LookupRecord>,
    pub used_web_search: bool,
}

impl AgentRunTrace {
    /// Highest score across every lookup, if any matched.
    pub fn best_score(&self) -> Option<f64> {
        self.lookups
            .iter()
            .filter_map(LookupRecord::best_score)
            .reduce(f64::max)
    }

    pub fn total_matches(&self) -> usize {
        self.lookups.iter().map(|l| l.matches.len()).sum()
    }

    /// Entry ids in the order they were first returned.
    pub fn referenced_ids(&self) -> impl Iterator<Item = &str> {
        self.lookups
            .iter()
            .flat_map(|l| l.matches.iter().map(|m| m.id.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct AgentRun {
    pub answer: String,
    pub trace: AgentRunTrace,
    pub usage: UsageStats,
    /// Model round-trips taken.
    pub reasoning_turns: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("reasoning turn limit reached ({0})")]
    MaxTurnsExceeded(u32),
    #[error("cancelled")]
    Cancelled,
    #[error("model call failed: {0}")]
    Transport(String),
}

/// A run that ended without an answer, with what it spent before stopping.
#[derive(Debug)]
pub struct RunFailure {
    pub error: RunError,
    pub usage: UsageStats,
}

impl RunFailure {
    fn new(error: RunError, usage: UsageStats) -> Self {
        Self { error, usage }
    }
}

pub async fn run_agent(
    provider: &Arc<dyn LlmProvider>,
    tools: &GuideTools,
    mut messages: Vec<Message>,
    opts: &RunOptions,
    cancel: &CancelToken,
) -> Result<AgentRun, RunFailure> {
    let definitions = tools.definitions();
    let mut trace = AgentRunTrace::default();
    let mut usage = UsageStats::default();

    for turn in 0..opts.max_turns {
        if cancel.is_cancelled() {
            return Err(RunFailure::new(RunError::Cancelled, usage));
        }

        let req = ChatRequest {
            messages: messages.clone(),
            tools: definitions.clone(),
            temperature: opts.temperature,
            max_tokens: opts.max_tokens,
            model: opts.model.clone(),
        };

        let llm_span = tracing::info_span!("llm.call", turn, provider = provider.provider_id());
        let resp = tokio::select! {
            _ = cancel.cancelled() => return Err(RunFailure::new(RunError::Cancelled, usage)),
            r = provider.chat(&req).instrument(llm_span) => match r {
                Ok(resp) => resp,
                Err(e) => {
                    return Err(RunFailure::new(RunError::Transport(e.to_string()), usage));
                }
            },
        };
        usage.record_request(resp.usage.as_ref());

        if !resp.wants_tools() {
            return Ok(AgentRun {
                answer: resp.content.trim().to_owned(),
                trace,
                usage,
                reasoning_turns: turn + 1,
            });
        }

        messages.push(Message::assistant_tool_calls(&resp.content, &resp.tool_calls));

        let outcomes = tokio::select! {
            _ = cancel.cancelled() => return Err(RunFailure::new(RunError::Cancelled, usage)),
            o = dispatch_all(tools, &resp.tool_calls) => o,
        };

        for (tc, outcome) in resp.tool_calls.iter().zip(outcomes) {
            if let Some(lookup) = outcome.lookup {
                trace.lookups.push(lookup);
            }
            trace.used_web_search |= outcome.web_search;
            messages.push(Message::tool_result(
                &tc.call_id,
                outcome.content,
                outcome.is_error,
            ));
        }
    }

    Err(RunFailure::new(RunError::MaxTurnsExceeded(opts.max_turns), usage))
}

/// Run a batch of tool calls concurrently, results in call order.
async fn dispatch_all(
    tools: &GuideTools,
    calls: &[ToolCall],
) -> Vec<super::tools::ToolOutcome> {
    let futures: Vec<_> = calls
        .iter()
        .map(|tc| {
            let span = tracing::info_span!("tool.call", tool_name = %tc.tool_name);
            tools.dispatch(tc).instrument(span)
        })
        .collect();
    futures_util::future::join_all(futures).await
}
