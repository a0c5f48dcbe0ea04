use tg_domain::error::Result;
use tg_domain::tool::{Message, ToolCall, ToolDefinition};
use tg_domain::usage::Usage;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// One model round-trip
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything the agent sends for one reasoning turn: the whole prompt so
/// far and the tools the model may call.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Empty means the model must answer in plain text.
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Overrides the provider's default model.
    pub model: Option<String>,
}

/// The model's reply: spoken text, tool calls, or both.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    /// Absent when the endpoint does not report token counts.
    pub usage: Option<Usage>,
    pub model: String,
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Whether the agent must run tools before the model can answer.
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The tool-calling model the guide's agent runs against.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// One non-streaming completion.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    fn provider_id(&self) -> &str;

    fn default_model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_only_reply_needs_no_tools() {
        let resp = ChatResponse {
            content: "The fountain dates from 1630.".into(),
            ..Default::default()
        };
        assert!(!resp.wants_tools());
    }

    #[test]
    fn tool_call_reply_needs_tools() {
        let resp = ChatResponse {
            tool_calls: vec![ToolCall {
                call_id: "c1".into(),
                tool_name: "knowledge_search".into(),
                arguments: serde_json::json!({ "query": "fountain" }),
            }],
            ..Default::default()
        };
        assert!(resp.wants_tools());
    }
}
