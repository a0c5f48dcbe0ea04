mod knowledge;
mod llm;
mod observability;
mod orchestrator;
mod search;
mod server;
mod sessions;

pub use knowledge::*;
pub use llm::*;
pub use observability::*;
pub use orchestrator::*;
pub use search::*;
pub use server::*;
pub use sessions::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub wake: WakeConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Errors should abort
    /// startup; warnings are informational.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }
        if self.server.max_body_bytes < 1024 {
            errors.push(ConfigError::error(
                "server.max_body_bytes",
                "must be at least 1024",
            ));
        }
        if let Some(rl) = &self.server.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                errors.push(ConfigError::error(
                    "server.rate_limit",
                    "requests_per_second and burst_size must be greater than 0",
                ));
            }
        }

        // CORS: warn if wildcard is used.
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError::error(
                "observability.sample_rate",
                "sample_rate must be between 0.0 and 1.0",
            ));
        }

        if self.wake.required_on_first_turn && self.wake.phrase.trim().is_empty() {
            errors.push(ConfigError::error(
                "wake.phrase",
                "phrase must not be empty when required_on_first_turn is set",
            ));
        }

        if self.sessions.idle_timeout_ms == 0 {
            errors.push(ConfigError::error(
                "sessions.idle_timeout_ms",
                "idle timeout must be greater than 0",
            ));
        }
        if self.sessions.idle_timeout_ms > MAX_IDLE_TIMEOUT_MS {
            errors.push(ConfigError::error(
                "sessions.idle_timeout_ms",
                format!("idle timeout must be at most {MAX_IDLE_TIMEOUT_MS} ms (7 days)"),
            ));
        }
        if self.sessions.max_turns == 0 {
            errors.push(ConfigError::error(
                "sessions.max_turns",
                "max_turns must be greater than 0",
            ));
        }
        if self.sessions.history_window == 0 {
            errors.push(ConfigError::warning(
                "sessions.history_window",
                "history window of 0 sends no prior turns to the model",
            ));
        }

        if self.archive.retention_per_session == 0 {
            errors.push(ConfigError::warning(
                "archive.retention_per_session",
                "retention of 0 keeps no conversation history",
            ));
        }

        if self.knowledge.default_limit == 0 {
            errors.push(ConfigError::error(
                "knowledge.default_limit",
                "default_limit must be greater than 0",
            ));
        }
        if self.knowledge.candidate_limit < self.knowledge.default_limit {
            errors.push(ConfigError::warning(
                "knowledge.candidate_limit",
                "candidate_limit is smaller than default_limit",
            ));
        }
        if self.knowledge.minimum_score < 0.0 {
            errors.push(ConfigError::error(
                "knowledge.minimum_score",
                "minimum_score must not be negative",
            ));
        }

        if self.orchestrator.max_agent_turns == 0 {
            errors.push(ConfigError::error(
                "orchestrator.max_agent_turns",
                "max_agent_turns must be greater than 0",
            ));
        }
        if self.orchestrator.max_input_chars == 0 {
            errors.push(ConfigError::error(
                "orchestrator.max_input_chars",
                "max_input_chars must be greater than 0",
            ));
        }
        if self.orchestrator.budget.max_requests < 2 {
            errors.push(ConfigError::warning(
                "orchestrator.budget.max_requests",
                "fewer than 2 requests leaves no room for a web-search fallback",
            ));
        }

        if !self.llm.is_configured() {
            errors.push(ConfigError::warning(
                "llm.base_url",
                "no LLM provider configured; guide turns will return 503",
            ));
        }
        if self.llm.id.is_empty() {
            errors.push(ConfigError::error("llm.id", "provider id must not be empty"));
        }
        if self.llm.default_model.is_empty() {
            errors.push(ConfigError::error(
                "llm.default_model",
                "default_model must not be empty",
            ));
        }

        if self.search.enabled && self.search.base_url.trim().is_empty() {
            errors.push(ConfigError::error(
                "search.base_url",
                "base_url must not be empty when search is enabled",
            ));
        }

        errors
    }
}
