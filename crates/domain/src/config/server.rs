use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_port")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Off unless set. Kiosks reachable from a public network should set it.
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    /// In-flight requests before new ones queue.
    #[serde(default = "d_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Largest accepted request body. Transcripts and notes are small.
    #[serde(default = "d_body_limit")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: d_port(),
            host: d_host(),
            cors: CorsConfig::default(),
            rate_limit: None,
            max_concurrent_requests: d_max_concurrent(),
            max_body_bytes: d_body_limit(),
        }
    }
}

/// Per-client-IP token bucket: refills at `requests_per_second`, holds at
/// most `burst_size`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u64,
    pub burst_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Exact origins, `host:*` for any port, or a lone `"*"`.
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

fn d_port() -> u16 {
    3280
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_max_concurrent() -> usize {
    128
}
fn d_body_limit() -> usize {
    64 * 1024
}
fn d_cors_origins() -> Vec<String> {
    vec!["http://localhost:*".into(), "http://127.0.0.1:*".into()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_kiosk_defaults() {
        let cfg: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.port, 3280);
        assert_eq!(cfg.host, "127.0.0.1");
        assert!(cfg.rate_limit.is_none());
        assert_eq!(cfg.max_body_bytes, 65_536);
        assert!(cfg
            .cors
            .allowed_origins
            .iter()
            .all(|o| o.ends_with(":*")));
    }

    #[test]
    fn public_deployment_with_rate_limit() {
        let cfg: ServerConfig = toml::from_str(
            r#"
            host = "0.0.0.0"
            max_body_bytes = 16384

            [cors]
            allowed_origins = ["https://kiosk.example.org"]

            [rate_limit]
            requests_per_second = 2
            burst_size = 6
            "#,
        )
        .unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.max_body_bytes, 16_384);
        assert_eq!(cfg.cors.allowed_origins, vec!["https://kiosk.example.org"]);
        let rl = cfg.rate_limit.unwrap();
        assert_eq!((rl.requests_per_second, rl.burst_size), (2, 6));
    }
}
