//! Live web search used to verify or fill in answers the local knowledge
//! index cannot support.

pub mod searxng;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tg_domain::error::Result;

pub use searxng::SearxngSearch;

/// One web result, as handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;

    /// Backend name, for logs and the health endpoint.
    fn name(&self) -> &str;
}
