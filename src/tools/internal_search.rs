//! `internal_search`: nearest-neighbour lookup over the local vector index.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::Tool;
use crate::error::{Error, Result};
use crate::vector::{SearchHit, VectorStore};

/// Default number of hits returned by `internal_search`.
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Deserialize)]
struct InternalSearchArgs {
    query: String,
    top_k: Option<usize>,
}

/// Searches the local vector index for relevant documents.
#[derive(Debug)]
pub struct InternalSearchTool {
    store: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl InternalSearchTool {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            default_top_k: DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k;
        self
    }

    /// Run a search directly, without going through JSON arguments.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        self.store.query(query, top_k).await
    }
}

#[async_trait]
impl Tool for InternalSearchTool {
    fn name(&self) -> &str {
        "internal_search"
    }

    fn description(&self) -> &str {
        "Searches the internal vector store for relevant documents."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The user search query."
                },
                "top_k": {
                    "type": "integer",
                    "description": format!("Maximum number of results to return (default {}).", self.default_top_k),
                    "default": self.default_top_k
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let args: InternalSearchArgs = serde_json::from_value(args)
            .map_err(|e| Error::Tool(format!("internal_search: {e}")))?;
        let top_k = args.top_k.unwrap_or(self.default_top_k);

        tracing::info!(query = %args.query, top_k = top_k, "internal_search");
        let hits = self.search(&args.query, top_k).await?;
        Ok(serde_json::to_value(hits)?)
    }
}
