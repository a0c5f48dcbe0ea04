use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The tool-calling model the dialogue agent talks to.
///
/// An empty `base_url` means no provider is configured: the gateway still
/// boots (health, sessions, knowledge search all work) but guide turns
/// return 503 until a provider is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_provider_id")]
    pub id: String,
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub default_model: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    /// Upper bound on completion tokens per request. `None` lets the
    /// provider decide.
    #[serde(default = "d_max_tokens")]
    pub max_tokens: Option<u32>,
    #[serde(default = "d_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            id: d_provider_id(),
            kind: ProviderKind::default(),
            base_url: String::new(),
            default_model: d_model(),
            auth: AuthConfig::default(),
            temperature: d_temperature(),
            max_tokens: d_max_tokens(),
            timeout_secs: d_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Any endpoint speaking the OpenAI `/chat/completions` dialect
    /// (OpenAI, Azure-compatible proxies, Ollama, vLLM, LM Studio...).
    #[default]
    OpenaiCompat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header name (e.g. "Authorization", "x-api-key").
    #[serde(default = "d_auth_header")]
    pub header: String,
    /// Header value prefix (e.g. "Bearer ").
    #[serde(default = "d_auth_prefix")]
    pub prefix: String,
    /// Env var containing the key. Leave unset for keyless local endpoints.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer `env`).
    #[serde(default)]
    pub key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: d_auth_header(),
            prefix: d_auth_prefix(),
            env: None,
            key: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_provider_id() -> String {
    "default".into()
}
fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_temperature() -> f32 {
    0.3
}
fn d_max_tokens() -> Option<u32> {
    Some(512)
}
fn d_timeout_secs() -> u64 {
    30
}
fn d_auth_header() -> String {
    "Authorization".into()
}
fn d_auth_prefix() -> String {
    "Bearer ".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unconfigured() {
        let cfg = LlmConfig::default();
        assert!(!cfg.is_configured());
        assert_eq!(cfg.kind, ProviderKind::OpenaiCompat);
        assert!(cfg.auth.env.is_none());
    }

    #[test]
    fn parses_provider_with_auth_env() {
        let toml_str = r#"
            id = "openai"
            kind = "openai_compat"
            base_url = "https://api.openai.com/v1"
            default_model = "gpt-4o"

            [auth]
            env = "OPENAI_API_KEY"
        "#;
        let cfg: LlmConfig = toml::from_str(toml_str).unwrap();
        assert!(cfg.is_configured());
        assert_eq!(cfg.id, "openai");
        assert_eq!(cfg.default_model, "gpt-4o");
        assert_eq!(cfg.auth.header, "Authorization");
        assert_eq!(cfg.auth.env.as_deref(), Some("OPENAI_API_KEY"));
    }
}
