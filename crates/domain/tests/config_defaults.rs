use tg_domain::config::{Config, ConfigSeverity};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn empty_file_equals_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.wake.phrase, "hey guide");
    assert_eq!(config.sessions.idle_timeout_ms, 30_000);
    assert_eq!(config.sessions.max_turns, 20);
    assert_eq!(config.knowledge.default_limit, 5);
    assert_eq!(config.orchestrator.max_agent_turns, 12);
    assert_eq!(config.orchestrator.budget.max_total_tokens, 16_000);
    assert!(!config.search.enabled);
}

#[test]
fn default_cors_allows_only_localhost() {
    let config = Config::default();
    assert!(config.server.cors.allowed_origins.contains(&"http://localhost:*".to_string()));
    assert!(config.server.cors.allowed_origins.contains(&"http://127.0.0.1:*".to_string()));
}

#[test]
fn full_kiosk_config_parses_and_validates() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 8080

[server.cors]
allowed_origins = ["https://kiosk.museum.example"]

[wake]
phrase = "hello museum"

[sessions]
idle_timeout_ms = 45000
history_window = 8

[archive]
path = "/var/lib/tourguide/conversations.json"

[knowledge]
index_path = "/etc/tourguide/knowledge.json"
minimum_score = 2.0

[orchestrator]
confidence_threshold = 6.0

[orchestrator.budget]
max_requests = 10

[llm]
id = "openai"
base_url = "https://api.openai.com/v1"
default_model = "gpt-4o-mini"

[search]
enabled = true
base_url = "http://searx.internal:8080"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.wake.phrase, "hello museum");
    assert_eq!(config.sessions.history_window, 8);
    assert_eq!(config.orchestrator.budget.max_requests, 10);
    assert!(config.llm.is_configured());
    assert!(config.search.enabled);

    let issues = config.validate();
    assert!(
        issues.iter().all(|e| e.severity != ConfigSeverity::Error),
        "unexpected errors: {issues:?}"
    );
}

#[test]
fn wildcard_cors_warns() {
    let toml_str = r#"
[server.cors]
allowed_origins = ["*"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|e| e.field == "server.cors.allowed_origins" && e.severity == ConfigSeverity::Warning));
}
