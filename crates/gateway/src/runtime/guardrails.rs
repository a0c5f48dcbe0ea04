//! Input and output guardrails around an orchestrated turn.

use serde::Serialize;

use tg_domain::tool::Message;
use tg_domain::trace::TraceEvent;

/// Which guardrail tripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "guardrail", rename_all = "snake_case")]
pub enum GuardrailKind {
    /// The serialized prompt is longer than the configured ceiling.
    InputTooLong { chars: usize, limit: usize },
    /// The final answer is empty after trimming.
    EmptyOutput,
}

impl GuardrailKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InputTooLong { .. } => "input_too_long",
            Self::EmptyOutput => "empty_output",
        }
    }

    fn emit(&self) {
        let detail = match self {
            Self::InputTooLong { chars, limit } => format!("{chars} chars > {limit}"),
            Self::EmptyOutput => "final answer is empty".to_owned(),
        };
        TraceEvent::GuardrailTripped {
            guardrail: self.name().to_owned(),
            detail,
        }
        .emit();
    }
}

/// Reject a prompt whose JSON serialization exceeds `max_chars` characters.
pub fn check_input(messages: &[Message], max_chars: usize) -> Result<(), GuardrailKind> {
    let chars = serde_json::to_string(messages)
        .map(|s| s.chars().count())
        .unwrap_or(usize::MAX);
    if chars > max_chars {
        let kind = GuardrailKind::InputTooLong {
            chars,
            limit: max_chars,
        };
        kind.emit();
        return Err(kind);
    }
    Ok(())
}

/// Reject an answer that is blank.
pub fn check_output(answer: &str) -> Result<(), GuardrailKind> {
    if answer.trim().is_empty() {
        let kind = GuardrailKind::EmptyOutput;
        kind.emit();
        return Err(kind);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_prompt_passes() {
        let msgs = vec![Message::system("You are a guide."), Message::user("Hi")];
        assert!(check_input(&msgs, 1000).is_ok());
    }

    #[test]
    fn long_prompt_trips() {
        let msgs = vec![Message::user("x".repeat(500))];
        let err = check_input(&msgs, 100).unwrap_err();
        assert!(matches!(err, GuardrailKind::InputTooLong { limit: 100, .. }));
        assert_eq!(err.name(), "input_too_long");
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 40 two-byte characters serialize to well under 100 chars.
        let msgs = vec![Message::user("é".repeat(40))];
        assert!(check_input(&msgs, 100).is_ok());
    }

    #[test]
    fn blank_output_trips() {
        assert_eq!(check_output("  \n "), Err(GuardrailKind::EmptyOutput));
        assert!(check_output("The fountain dates from 1630.").is_ok());
    }
}
