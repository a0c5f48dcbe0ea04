//! Guide runtime: the per-turn pipeline from utterance to spoken reply.
//!
//! Entry point: [`turn::run_guide_turn`] resolves the session and calls the
//! [`orchestrator::Orchestrator`], which drives one or two agent runs over
//! the knowledge and web-search tools.

pub mod agent;
pub mod budget;
pub mod cancel;
pub mod escalation;
pub mod guardrails;
pub mod orchestrator;
pub mod prompt;
pub mod session_lock;
pub mod tools;
pub mod turn;

pub use orchestrator::{Orchestrator, TurnOutcome, TurnRequest};
pub use turn::{run_guide_turn, GuideError, GuideRequest, GuideResponse};
