//! Tools the guide model may call: local knowledge lookup and, when a
//! backend is configured, live web search.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use tg_domain::config::{KnowledgeConfig, SearchConfig};
use tg_domain::tool::{ToolCall, ToolDefinition};
use tg_domain::trace::TraceEvent;
use tg_knowledge::KnowledgeIndex;

use crate::search::WebSearchProvider;

pub const KNOWLEDGE_SEARCH: &str = "knowledge_search";
pub const WEB_SEARCH: &str = "web_search";

/// One knowledge lookup as seen by escalation: what was asked and which
/// entries came back with what score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupRecord {
    pub query: String,
    pub limit: usize,
    pub minimum_score: f64,
    pub matches: Vec<LookupHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupHit {
    pub id: String,
    pub score: f64,
}

impl LookupRecord {
    pub fn best_score(&self) -> Option<f64> {
        self.matches.iter().map(|m| m.score).reduce(f64::max)
    }
}

/// Result of one tool call, plus what the run trace should remember.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
    pub lookup: Option<LookupRecord>,
    pub web_search: bool,
}

impl ToolOutcome {
    fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
            lookup: None,
            web_search: false,
        }
    }
}

pub struct GuideTools {
    knowledge: Arc<KnowledgeIndex>,
    knowledge_cfg: KnowledgeConfig,
    search: Option<Arc<dyn WebSearchProvider>>,
    max_web_results: usize,
}

impl GuideTools {
    pub fn new(
        knowledge: Arc<KnowledgeIndex>,
        knowledge_cfg: KnowledgeConfig,
        search: Option<Arc<dyn WebSearchProvider>>,
        search_cfg: &SearchConfig,
    ) -> Self {
        Self {
            knowledge,
            knowledge_cfg,
            search,
            max_web_results: search_cfg.max_results,
        }
    }

    pub fn web_search_available(&self) -> bool {
        self.search.is_some()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs = vec![ToolDefinition {
            name: KNOWLEDGE_SEARCH.into(),
            description: "Search the venue's curated knowledge base. Returns scored entries \
                          with highlights; higher scores mean stronger matches."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Keywords naming the exhibit, place or topic" },
                    "limit": { "type": "integer", "description": "Maximum entries to return" },
                    "minimum_score": { "type": "number", "description": "Drop entries scoring below this" }
                },
                "required": ["query"]
            }),
        }];

        if self.search.is_some() {
            defs.push(ToolDefinition {
                name: WEB_SEARCH.into(),
                description: "Search the public web. Use when the knowledge base has no \
                              confident answer or to verify a fact."
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "Search query" }
                    },
                    "required": ["query"]
                }),
            });
        }
        defs
    }

    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutcome {
        match call.tool_name.as_str() {
            KNOWLEDGE_SEARCH => self.knowledge_search(&call.arguments),
            WEB_SEARCH => self.web_search(&call.arguments).await,
            other => ToolOutcome::error(format!("unknown tool '{other}'")),
        }
    }

    fn knowledge_search(&self, arguments: &Value) -> ToolOutcome {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if query.is_empty() {
            return ToolOutcome::error("knowledge_search requires a non-empty 'query'");
        }

        let cfg = &self.knowledge_cfg;
        let limit = arguments
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(cfg.default_limit)
            .clamp(1, cfg.candidate_limit.max(1));
        let minimum_score = arguments
            .get("minimum_score")
            .and_then(|v| v.as_f64())
            .unwrap_or(cfg.minimum_score)
            .max(0.0);

        let matches = self.knowledge.search_filtered(query, limit, minimum_score);
        let record = LookupRecord {
            query: query.to_owned(),
            limit,
            minimum_score,
            matches: matches
                .iter()
                .map(|m| LookupHit {
                    id: m.entry.id.clone(),
                    score: m.score,
                })
                .collect(),
        };

        TraceEvent::KnowledgeLookup {
            query: record.query.clone(),
            limit,
            minimum_score,
            matches: record.matches.len(),
            best_score: record.best_score(),
        }
        .emit();

        let content = if matches.is_empty() {
            json!({ "matches": [], "note": "No knowledge entry matched this query." })
        } else {
            json!({ "matches": matches })
        };
        ToolOutcome {
            content: content.to_string(),
            is_error: false,
            lookup: Some(record),
            web_search: false,
        }
    }

    async fn web_search(&self, arguments: &Value) -> ToolOutcome {
        let Some(search) = &self.search else {
            return ToolOutcome::error("web search is not available");
        };
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if query.is_empty() {
            return ToolOutcome::error("web_search requires a non-empty 'query'");
        }

        let (content, is_error) = match search.search(query, self.max_web_results).await {
            Ok(results) => (json!({ "results": results }).to_string(), false),
            Err(e) => {
                tracing::warn!(backend = search.name(), error = %e, "web search failed");
                (format!("web search error: {e}"), true)
            }
        };
        ToolOutcome {
            content,
            is_error,
            lookup: None,
            web_search: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_knowledge::{IndexMeta, KnowledgeEntry};

    fn tools() -> GuideTools {
        let entries = vec![
            KnowledgeEntry {
                id: "fountain".into(),
                name: "Medici Fountain".into(),
                summary: "A baroque fountain.".into(),
                details: String::new(),
                tags: vec!["water".into()],
                location: None,
                sources: vec![],
            },
            KnowledgeEntry {
                id: "tower".into(),
                name: "Clock Tower".into(),
                summary: "Medieval tower.".into(),
                details: "Near the fountain.".into(),
                tags: vec![],
                location: None,
                sources: vec![],
            },
        ];
        GuideTools::new(
            Arc::new(KnowledgeIndex::new(IndexMeta::default(), entries)),
            KnowledgeConfig::default(),
            None,
            &SearchConfig::default(),
        )
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall {
            call_id: "c1".into(),
            tool_name: name.into(),
            arguments: args,
        }
    }

    #[test]
    fn web_search_hidden_without_backend() {
        let names: Vec<String> = tools().definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec![KNOWLEDGE_SEARCH]);
    }

    #[tokio::test]
    async fn knowledge_lookup_records_hits() {
        let out = tools()
            .dispatch(&call(KNOWLEDGE_SEARCH, json!({"query": "medici fountain"})))
            .await;
        assert!(!out.is_error);
        let lookup = out.lookup.unwrap();
        assert_eq!(lookup.matches[0].id, "fountain");
        assert_eq!(lookup.limit, 5);
        // default minimum_score 1.0 keeps the details-only hit
        assert_eq!(lookup.matches.len(), 2);
        let v: Value = serde_json::from_str(&out.content).unwrap();
        assert_eq!(v["matches"][0]["name"], "Medici Fountain");
    }

    #[tokio::test]
    async fn limit_is_capped_by_candidate_limit() {
        let out = tools()
            .dispatch(&call(KNOWLEDGE_SEARCH, json!({"query": "fountain", "limit": 500})))
            .await;
        assert_eq!(out.lookup.unwrap().limit, 20);
    }

    #[tokio::test]
    async fn zero_match_lookup_is_recorded() {
        let out = tools()
            .dispatch(&call(KNOWLEDGE_SEARCH, json!({"query": "submarine"})))
            .await;
        assert!(!out.is_error);
        assert!(out.lookup.unwrap().matches.is_empty());
    }

    #[tokio::test]
    async fn missing_query_is_tool_error() {
        let out = tools().dispatch(&call(KNOWLEDGE_SEARCH, json!({}))).await;
        assert!(out.is_error);
        assert!(out.lookup.is_none());
    }

    #[tokio::test]
    async fn unknown_tool_and_unavailable_search_error() {
        let t = tools();
        assert!(t.dispatch(&call("exec", json!({}))).await.is_error);
        let out = t.dispatch(&call(WEB_SEARCH, json!({"query": "x"}))).await;
        assert!(out.is_error);
        assert!(!out.web_search);
    }
}
