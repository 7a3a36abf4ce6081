//! Vector store client used to retrieve winning-proposal context.

use async_trait::async_trait;
use dealvelocity_ai::ContextSource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::ServiceError;

pub const DEFAULT_NAMESPACE: &str = "deal-velocity";
/// Matches folded into a proposal prompt.
pub const CONTEXT_TOP_K: usize = 3;

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
    namespace: &'a str,
    include_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchMatch {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SearchMatch {
    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Source document name, falling back to the match id.
    pub fn filename(&self) -> &str {
        self.metadata_str("filename").unwrap_or(self.id.as_str())
    }

    pub fn text(&self) -> Option<&str> {
        self.metadata_str("text").filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default, alias = "matches")]
    pub results: Vec<SearchMatch>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub count: usize,
}

/// Render matches as `[Source: <filename>]` blocks separated by blank lines.
///
/// Matches without text are skipped.
pub fn format_context(matches: &[SearchMatch]) -> String {
    matches
        .iter()
        .filter_map(|m| Some(format!("[Source: {}]\n{}", m.filename(), m.text()?)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// HTTP client for the vector store's search endpoint.
pub struct VectorStoreClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    namespace: String,
}

impl VectorStoreClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchMatch>, ServiceError> {
        let url = format!("{}/search", self.base_url);
        debug!(url = %url, top_k, namespace = %self.namespace, "searching vector store");

        let body = SearchRequest {
            query,
            top_k,
            namespace: &self.namespace,
            include_metadata: true,
        };
        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("X-Api-Key", key);
        }

        let resp: SearchResponse = ServiceError::check(req.send().await?).await?.json().await?;
        info!(count = resp.results.len(), "vector search complete");
        Ok(resp.results)
    }
}

#[async_trait]
impl ContextSource for VectorStoreClient {
    async fn context_for(&self, query: &str) -> anyhow::Result<String> {
        let matches = self.search(query, CONTEXT_TOP_K).await?;
        let top = &matches[..matches.len().min(CONTEXT_TOP_K)];
        Ok(format_context(top))
    }
}
