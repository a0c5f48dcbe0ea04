use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Logging and tracing export
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How `serve` logs, and where its spans go.
///
/// `RUST_LOG` overrides `log_filter` when set. With no `otlp_endpoint`
/// the `guide.turn`, `llm.call` and `tool.call` spans stay local.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `tracing_subscriber::EnvFilter` directives.
    #[serde(default = "d_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// OTLP gRPC collector, e.g. `http://localhost:4317`.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    #[serde(default = "d_service_name")]
    pub service_name: String,

    /// Fraction of guide turns whose traces are exported, `0.0..=1.0`.
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON object per line, for log shippers.
    #[default]
    Json,
    /// Human-readable single-line output for a kiosk console.
    Compact,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: d_log_filter(),
            log_format: LogFormat::default(),
            otlp_endpoint: None,
            service_name: d_service_name(),
            sample_rate: d_sample_rate(),
        }
    }
}

fn d_log_filter() -> String {
    "info,tg_gateway=debug".into()
}
fn d_service_name() -> String {
    "tourguide".into()
}
fn d_sample_rate() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_logs_json_locally() {
        let cfg: ObservabilityConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.log_filter, "info,tg_gateway=debug");
        assert!(cfg.otlp_endpoint.is_none());
        assert_eq!(cfg.service_name, "tourguide");
    }

    #[test]
    fn kiosk_console_with_collector() {
        let cfg: ObservabilityConfig = toml::from_str(
            r#"
            log_format = "compact"
            log_filter = "warn,tg_gateway=info"
            otlp_endpoint = "http://collector:4317"
            sample_rate = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(cfg.log_format, LogFormat::Compact);
        assert_eq!(cfg.otlp_endpoint.as_deref(), Some("http://collector:4317"));
        assert!((cfg.sample_rate - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(toml::from_str::<ObservabilityConfig>(r#"log_format = "xml""#).is_err());
    }
}
