use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{Document, Embedder, SearchHit, VectorStore};
use crate::error::{Error, Result};

/// A stored document together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedDocument {
    #[serde(flatten)]
    document: Document,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Collection {
    /// Embedding width, fixed by the first stored document.
    #[serde(default)]
    dimension: Option<usize>,
    entries: Vec<IndexedDocument>,
}

/// Persistent, exact-scan vector collection.
///
/// The collection lives in `<dir>/<name>.json`. Every mutation is written to
/// disk before it becomes visible in memory, so a failed write leaves both
/// unchanged. Queries compare against every entry by squared L2 distance.
pub struct LocalIndex {
    path: PathBuf,
    embedder: Arc<dyn Embedder>,
    collection: RwLock<Collection>,
}

impl std::fmt::Debug for LocalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalIndex")
            .field("path", &self.path)
            .field("embedder", &self.embedder)
            .finish()
    }
}

impl LocalIndex {
    /// Open the named collection under `dir`, creating both if missing.
    pub async fn open(
        dir: impl AsRef<Path>,
        name: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{name}.json"));

        let collection = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Collection>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Collection::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %path.display(),
            document_count = collection.entries.len(),
            dimension = ?collection.dimension,
            "Opened vector collection"
        );

        Ok(Self {
            path,
            embedder,
            collection: RwLock::new(collection),
        })
    }

    /// Drop every document in the collection.
    pub async fn reset(&self) -> Result<()> {
        let mut collection = self.collection.write().await;
        let emptied = Collection::default();
        self.persist(&emptied).await?;
        *collection = emptied;
        info!(path = %self.path.display(), "Vector collection reset");
        Ok(())
    }

    async fn persist(&self, collection: &Collection) -> Result<()> {
        let bytes = serde_json::to_vec(collection)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn check_dimension(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Error::Embedding(format!(
                "embedding dimension mismatch: collection has {expected}, got {actual}"
            )))
        }
    }

    fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }
}

#[async_trait]
impl VectorStore for LocalIndex {
    async fn add(&self, documents: Vec<Document>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut seen = HashSet::new();
        for doc in &documents {
            if !seen.insert(doc.id.as_str()) {
                return Err(Error::DuplicateId(doc.id.clone()));
            }
        }

        let texts = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed(texts).await?;
        if embeddings.len() != documents.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                documents.len(),
                embeddings.len()
            )));
        }

        let mut collection = self.collection.write().await;
        if let Some(existing) = collection
            .entries
            .iter()
            .find(|e| seen.contains(e.document.id.as_str()))
        {
            return Err(Error::DuplicateId(existing.document.id.clone()));
        }

        let dimension = collection
            .dimension
            .or_else(|| embeddings.first().map(Vec::len))
            .unwrap_or_default();
        for embedding in &embeddings {
            Self::check_dimension(dimension, embedding.len())?;
        }

        let mut updated = collection.clone();
        updated.dimension = Some(dimension);
        updated.entries.extend(
            documents
                .into_iter()
                .zip(embeddings)
                .map(|(document, embedding)| IndexedDocument {
                    document,
                    embedding,
                }),
        );
        self.persist(&updated).await?;

        let added = updated.entries.len() - collection.entries.len();
        *collection = updated;

        debug!(
            added = added,
            total = collection.entries.len(),
            "Documents added to collection"
        );
        Ok(())
    }

    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<SearchHit>> {
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("no embedding generated".to_string()))?;

        let collection = self.collection.read().await;
        if let Some(dimension) = collection.dimension {
            Self::check_dimension(dimension, query_embedding.len())?;
        }

        let mut scored: Vec<(f32, &Document)> = collection
            .entries
            .iter()
            .map(|e| (Self::l2_squared(&query_embedding, &e.embedding), &e.document))
            .collect();

        // Sort by distance asc
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        let hits: Vec<SearchHit> = scored
            .into_iter()
            .take(n_results)
            .enumerate()
            .map(|(i, (score, doc))| SearchHit {
                rank: i + 1,
                id: doc.id.clone(),
                text: doc.text.clone(),
                score,
            })
            .collect();

        debug!(query = %text, hit_count = hits.len(), "Vector query complete");
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.collection.read().await.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Embeds a text as its (length, vowel count) pair.
    #[derive(Debug)]
    struct ShapeEmbedder;

    #[async_trait]
    impl Embedder for ShapeEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let vowels = t.chars().filter(|c| "aeiou".contains(*c)).count();
                    vec![t.len() as f32, vowels as f32]
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_query_ranks_by_distance() {
        let dir = tempfile::tempdir().unwrap();
        let index = LocalIndex::open(dir.path(), "internal_docs", Arc::new(ShapeEmbedder))
            .await
            .unwrap();

        index
            .add(vec![
                Document::new("a"),
                Document::new("aaaa"),
                Document::new("aaaaaaaaaaaaa"),
            ])
            .await
            .unwrap();

        let hits = index.query("aaa", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[0].text, "aaaa");
        assert_eq!(hits[1].text, "a");
        assert!(hits[0].score <= hits[1].score);
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let index = LocalIndex::open(dir.path(), "docs", Arc::new(ShapeEmbedder))
            .await
            .unwrap();

        let doc = Document::new("hello");
        index.add(vec![doc.clone()]).await.unwrap();
        let err = index.add(vec![doc]).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_collection_persists_and_resets() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = LocalIndex::open(dir.path(), "docs", Arc::new(ShapeEmbedder))
                .await
                .unwrap();
            index
                .add(vec![Document::new("one"), Document::new("two")])
                .await
                .unwrap();
        }

        let reopened = LocalIndex::open(dir.path(), "docs", Arc::new(ShapeEmbedder))
            .await
            .unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);

        reopened.reset().await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 0);
        assert!(reopened.query("one", 5).await.unwrap().is_empty());
    }

    /// Embeds every text as a single length value.
    #[derive(Debug)]
    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_collection_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("index");
        let index = LocalIndex::open(&index_dir, "docs", Arc::new(ShapeEmbedder))
            .await
            .unwrap();
        index.add(vec![Document::new("kept")]).await.unwrap();

        std::fs::remove_dir_all(&index_dir).unwrap();

        let err = index.add(vec![Document::new("lost")]).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(index.count().await.unwrap(), 1);

        assert!(index.reset().await.is_err());
        assert_eq!(index.count().await.unwrap(), 1);
        assert_eq!(index.query("kept", 5).await.unwrap()[0].text, "kept");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = LocalIndex::open(dir.path(), "docs", Arc::new(ShapeEmbedder))
                .await
                .unwrap();
            index.add(vec![Document::new("two dims")]).await.unwrap();
        }

        let reopened = LocalIndex::open(dir.path(), "docs", Arc::new(LengthEmbedder))
            .await
            .unwrap();
        assert!(matches!(
            reopened.query("one dim", 5).await.unwrap_err(),
            Error::Embedding(_)
        ));
        assert!(matches!(
            reopened.add(vec![Document::new("one dim")]).await.unwrap_err(),
            Error::Embedding(_)
        ));
        assert_eq!(reopened.count().await.unwrap(), 1);

        // An emptied collection accepts the new width
        reopened.reset().await.unwrap();
        reopened.add(vec![Document::new("one dim")]).await.unwrap();
        assert_eq!(reopened.query("one dim", 5).await.unwrap().len(), 1);
    }
}
