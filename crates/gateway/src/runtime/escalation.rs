//! When a local-knowledge answer is too weak to stand on its own.

use super::agent::AgentRunTrace;

#[derive(Debug, Clone, PartialEq)]
pub enum EscalationReason {
    EmptyAnswer,
    NoLookup,
    NoMatches,
    LowConfidence { best_score: f64, threshold: f64 },
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAnswer => write!(f, "empty_answer"),
            Self::NoLookup => write!(f, "no_lookup"),
            Self::NoMatches => write!(f, "no_matches"),
            Self::LowConfidence {
                best_score,
                threshold,
            } => write!(f, "low_confidence ({best_score} < {threshold})"),
        }
    }
}

/// Why the run should be retried with web search preferred, or `None`
/// when its answer stands. A run that already searched the web never
/// escalates.
pub fn escalation_reason(
    answer: &str,
    trace: &AgentRunTrace,
    threshold: f64,
) -> Option<EscalationReason> {
    if trace.used_web_search {
        return None;
    }
    if answer.trim().is_empty() {
        return Some(EscalationReason::EmptyAnswer);
    }
    if trace.lookups.is_empty() {
        return Some(EscalationReason::NoLookup);
    }
    match trace.best_score() {
        None => Some(EscalationReason::NoMatches),
        Some(best) if best < threshold => Some(EscalationReason::LowConfidence {
            best_score: best,
            threshold,
        }),
        Some(_) => None,
    }
}

pub fn should_fallback_to_web_search(answer: &str, trace: &AgentRunTrace, threshold: f64) -> bool {
    escalation_reason(answer, trace, threshold).is_some()
}
