//! Local vector index used by the `internal_search` tool.
//!
//! - [`Embedder`]: turns text into vectors ([`FastEmbedder`] runs a local ONNX model)
//! - [`VectorStore`]: add / query / count over a collection of [`Document`]s
//! - [`LocalIndex`]: persistent JSON-backed collection ranked by L2 distance

pub mod embed;
pub mod local;

pub use embed::{Embedder, FastEmbedder};
pub use local::LocalIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// A document stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (UUID v4 for ingested documents).
    pub id: String,
    /// Raw document text.
    pub text: String,
    /// Free-form metadata; empty for ingested documents.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Wrap text with a fresh id and empty metadata.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// 1-based rank, closest first.
    pub rank: usize,
    /// Document id.
    pub id: String,
    /// Document text.
    pub text: String,
    /// Distance to the query (lower is closer).
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync + std::fmt::Debug {
    /// Add documents to the collection.
    async fn add(&self, documents: Vec<Document>) -> Result<()>;

    /// Return at most `n_results` hits ranked ascending by distance.
    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<SearchHit>>;

    /// Number of documents in the collection.
    async fn count(&self) -> Result<usize>;
}

/// Add raw text documents to the store, returning their generated ids.
pub async fn ingest_documents<S, T>(store: &S, texts: T) -> Result<Vec<String>>
where
    S: VectorStore + ?Sized,
    T: IntoIterator,
    T::Item: Into<String>,
{
    let documents: Vec<Document> = texts.into_iter().map(Document::new).collect();
    let ids = documents.iter().map(|d| d.id.clone()).collect();

    tracing::info!(document_count = documents.len(), "Ingesting documents");
    store.add(documents).await?;
    Ok(ids)
}
