//! Dialogue orchestrator: one visitor utterance in, one spoken reply out.
//!
//! ```text
//! Init ─► input guardrail ─► PrimaryRun ─► budget ─► escalate? ──no──► output guardrail ─► Answered
//!                                                        │yes
//!                                                        ▼
//!                                   FallbackRun (web first) ─► budget ─► output guardrail ─► Answered
//! ```
//!
//! Every failure becomes a [`TurnOutcome`] carrying a speakable reply;
//! nothing propagates to the caller as an error. The fallback run happens
//! at most once and always after the primary run has finished.

use std::sync::Arc;

use tracing::Instrument;

use tg_domain::config::{LlmConfig, OrchestratorConfig};
use tg_domain::tool::Message;
use tg_domain::trace::TraceEvent;
use tg_domain::usage::UsageStats;
use tg_providers::LlmProvider;

use super::agent::{run_agent, AgentRun, RunError, RunOptions};
use super::budget::TurnBudget;
use super::cancel::CancelToken;
use super::escalation::escalation_reason;
use super::guardrails::{self, GuardrailKind};
use super::prompt::{self, PromptContext};
use super::tools::GuideTools;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fixed replies
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const BUDGET_REPLY: &str = "That question needed more processing budget than I have for \
one answer. Could you rephrase it more concisely?";
pub const GUARDRAIL_REPLY: &str =
    "Sorry, I can't answer that one. Could you ask it a different way?";
pub const REASONING_LIMIT_REPLY: &str =
    "I couldn't work that out in time. Could you narrow your question a little?";
pub const FAILURE_REPLY: &str =
    "Sorry, something went wrong on my side. Please try again in a moment.";
pub const CANCELLED_REPLY: &str = "Okay, I'll stop there.";
pub const UNVERIFIED_NOTE: &str =
    "Web verification was incomplete; this answer may be inaccurate.";
pub const NO_WEB_SEARCH_NOTE: &str =
    "Local knowledge was not conclusive and web search is not configured; this answer is unverified.";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything one turn needs besides the session itself.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub utterance: String,
    /// Prior exchanges, oldest first.
    pub history: Vec<Message>,
    pub notes: Vec<String>,
    pub context: PromptContext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub knowledge_references: Vec<String>,
    pub used_web_search: bool,
    pub web_search_note: Option<String>,
    pub escalated: bool,
    pub usage: UsageStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Answered(Answer),
    BudgetExceeded,
    GuardrailRejected(GuardrailKind),
    ReasoningLimitExceeded,
    Failed(String),
    Cancelled,
}

impl TurnOutcome {
    /// The text spoken back to the visitor.
    pub fn reply(&self) -> &str {
        match self {
            Self::Answered(a) => &a.text,
            Self::BudgetExceeded => BUDGET_REPLY,
            Self::GuardrailRejected(_) => GUARDRAIL_REPLY,
            Self::ReasoningLimitExceeded => REASONING_LIMIT_REPLY,
            Self::Failed(_) => FAILURE_REPLY,
            Self::Cancelled => CANCELLED_REPLY,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Answered(_) => "answered",
            Self::BudgetExceeded => "budget_exceeded",
            Self::GuardrailRejected(_) => "guardrail_rejected",
            Self::ReasoningLimitExceeded => "reasoning_limit_exceeded",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Self::Answered(a) => Some(a),
            _ => None,
        }
    }

    fn from_run_error(err: RunError) -> Self {
        match err {
            RunError::MaxTurnsExceeded(_) => Self::ReasoningLimitExceeded,
            RunError::Cancelled => Self::Cancelled,
            RunError::Transport(msg) => {
                tracing::error!(error = %msg, "agent run failed");
                Self::Failed(msg)
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Orchestrator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    tools: GuideTools,
    config: OrchestratorConfig,
    budget: TurnBudget,
    run_options: RunOptions,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: GuideTools,
        config: OrchestratorConfig,
        llm: &LlmConfig,
    ) -> Self {
        let run_options = RunOptions {
            max_turns: config.max_agent_turns,
            temperature: Some(llm.temperature),
            max_tokens: llm.max_tokens,
            model: None,
        };
        Self {
            provider,
            budget: TurnBudget::new(config.budget.clone()),
            tools,
            config,
            run_options,
        }
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub fn web_search_available(&self) -> bool {
        self.tools.web_search_available()
    }

    pub async fn orchestrate(&self, req: &TurnRequest, cancel: &CancelToken) -> TurnOutcome {
        let span = tracing::info_span!("guide.turn", utterance_chars = req.utterance.chars().count());
        self.orchestrate_inner(req, cancel).instrument(span).await
    }

    async fn orchestrate_inner(&self, req: &TurnRequest, cancel: &CancelToken) -> TurnOutcome {
        // ── PrimaryRun ───────────────────────────────────────────
        let primary = match self.run(req, false, cancel).await {
            Ok(run) => run,
            Err((outcome, spent)) => return self.over_budget_or(outcome, &spent),
        };
        let mut usage = primary.usage;
        if self.budget.check(&usage).is_err() {
            return TurnOutcome::BudgetExceeded;
        }

        let Some(reason) =
            escalation_reason(&primary.answer, &primary.trace, self.config.confidence_threshold)
        else {
            return finish(primary.answer.clone(), &[&primary], None, false, usage);
        };

        TraceEvent::Escalation {
            reason: reason.to_string(),
        }
        .emit();

        if !self.tools.web_search_available() {
            let note = Some(NO_WEB_SEARCH_NOTE.to_owned());
            return finish(primary.answer.clone(), &[&primary], note, false, usage);
        }

        // ── FallbackRun ──────────────────────────────────────────
        let fallback = match self.run(req, true, cancel).await {
            Ok(run) => run,
            Err((TurnOutcome::Cancelled, _)) => return TurnOutcome::Cancelled,
            Err((outcome, spent)) => {
                usage.merge(&spent);
                if self.budget.check(&usage).is_err() {
                    return TurnOutcome::BudgetExceeded;
                }
                if primary.answer.is_empty() {
                    return outcome;
                }
                tracing::warn!(
                    outcome = outcome.kind(),
                    "fallback run failed, keeping primary answer"
                );
                let note = Some(UNVERIFIED_NOTE.to_owned());
                return finish(primary.answer.clone(), &[&primary], note, true, usage);
            }
        };
        usage.merge(&fallback.usage);
        if self.budget.check(&usage).is_err() {
            return TurnOutcome::BudgetExceeded;
        }

        let still_weak = escalation_reason(
            &fallback.answer,
            &fallback.trace,
            self.config.confidence_threshold,
        )
        .is_some();
        let note = still_weak.then(|| UNVERIFIED_NOTE.to_owned());

        let text = if fallback.answer.is_empty() {
            primary.answer.clone()
        } else {
            fallback.answer.clone()
        };
        finish(text, &[&primary, &fallback], note, true, usage)
    }

    /// A run that failed still spent tokens; over the ceiling, the budget
    /// reply wins over the failure's own. Cancellation is never rewritten.
    fn over_budget_or(&self, outcome: TurnOutcome, spent: &UsageStats) -> TurnOutcome {
        if outcome != TurnOutcome::Cancelled && self.budget.check(spent).is_err() {
            return TurnOutcome::BudgetExceeded;
        }
        outcome
    }

    /// One agent run, with the input guardrail applied to its prompt. A
    /// failed run reports the usage it accrued before failing.
    async fn run(
        &self,
        req: &TurnRequest,
        prefer_web_search: bool,
        cancel: &CancelToken,
    ) -> Result<AgentRun, (TurnOutcome, UsageStats)> {
        let system = prompt::system_instruction(
            &req.context,
            &req.notes,
            prefer_web_search,
            self.tools.web_search_available(),
        );
        let messages = prompt::initial_messages(system, &req.history, &req.utterance);
        guardrails::check_input(&messages, self.config.max_input_chars)
            .map_err(|kind| (TurnOutcome::GuardrailRejected(kind), UsageStats::default()))?;

        let run = run_agent(&self.provider, &self.tools, messages, &self.run_options, cancel)
            .await
            .map_err(|f| (TurnOutcome::from_run_error(f.error), f.usage))?;

        TraceEvent::AgentRunCompleted {
            prefer_web_search,
            reasoning_turns: run.reasoning_turns,
            lookups: run.trace.lookups.len(),
            used_web_search: run.trace.used_web_search,
            total_tokens: run.usage.total_tokens,
        }
        .emit();
        Ok(run)
    }
}

/// Apply the output guardrail and assemble the answer.
fn finish(
    text: String,
    runs: &[&AgentRun],
    web_search_note: Option<String>,
    escalated: bool,
    usage: UsageStats,
) -> TurnOutcome {
    if let Err(kind) = guardrails::check_output(&text) {
        return TurnOutcome::GuardrailRejected(kind);
    }

    let mut knowledge_references: Vec<String> = Vec::new();
    for id in runs.iter().flat_map(|r| r.trace.referenced_ids()) {
        if !knowledge_references.iter().any(|r| r == id) {
            knowledge_references.push(id.to_owned());
        }
    }

    TurnOutcome::Answered(Answer {
        text,
        knowledge_references,
        used_web_search: runs.iter().any(|r| r.trace.used_web_search),
        web_search_note,
        escalated,
        usage,
    })
}
