//! SearXNG JSON backend (`GET {base}/search?q=..&format=json`).
//!
//! Requests carry a hard timeout and redirect limit; the body is streamed
//! with a byte cap so a misbehaving instance cannot exhaust memory.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;

use tg_domain::config::SearchConfig;
use tg_domain::error::{Error, Result};
use tg_domain::trace::TraceEvent;

use super::{SearchResult, WebSearchProvider};

const UA: &str = concat!("tourguide/", env!("CARGO_PKG_VERSION"));
const MAX_SNIPPET_CHARS: usize = 400;

pub struct SearxngSearch {
    client: reqwest::Client,
    base_url: String,
    max_bytes: usize,
}

impl SearxngSearch {
    pub fn from_config(cfg: &SearchConfig) -> Result<Self> {
        if cfg.base_url.trim().is_empty() {
            return Err(Error::Config("search.base_url is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Search(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            max_bytes: cfg.max_bytes,
        })
    }

    async fn fetch(&self, query: &str) -> Result<Vec<u8>> {
        let url = format!("{}/search", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json")])
            .header(USER_AGENT, UA)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("web search: {e}"))
                } else {
                    Error::Search(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Search(format!("{url} returned {status}")));
        }

        let mut stream = resp.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Search(e.to_string()))?;
            if buf.len() + chunk.len() > self.max_bytes {
                return Err(Error::Search(format!(
                    "response exceeded {} bytes",
                    self.max_bytes
                )));
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}

#[async_trait]
impl WebSearchProvider for SearxngSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let start = Instant::now();
        let body = self.fetch(query).await?;
        let results = parse_results(&body, max_results)?;

        TraceEvent::WebSearch {
            query: query.to_owned(),
            results: results.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();
        Ok(results)
    }

    fn name(&self) -> &str {
        "searxng"
    }
}

// ── Response parsing ───────────────────────────────────────────────

#[derive(Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngHit>,
}

#[derive(Deserialize)]
struct SearxngHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

fn parse_results(body: &[u8], max_results: usize) -> Result<Vec<SearchResult>> {
    let parsed: SearxngResponse = serde_json::from_slice(body)
        .map_err(|e| Error::Search(format!("malformed response: {e}")))?;

    Ok(parsed
        .results
        .into_iter()
        .filter(|h| !h.url.is_empty())
        .take(max_results)
        .map(|h| SearchResult {
            title: collapse_whitespace(&h.title),
            url: h.url,
            snippet: collapse_whitespace(&h.content)
                .chars()
                .take(MAX_SNIPPET_CHARS)
                .collect(),
        })
        .collect())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
