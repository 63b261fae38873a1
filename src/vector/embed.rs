use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Error, Result};

#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Embed each text; output order matches input order.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// Sentence embeddings from a local fastembed model (all-MiniLM-L6-v2).
///
/// The model is loaded lazily on first use and runs on a blocking thread.
pub struct FastEmbedder {
    model: Arc<Mutex<Option<TextEmbedding>>>,
    kind: EmbeddingModel,
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model", &self.kind)
            .finish()
    }
}

impl Default for FastEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl FastEmbedder {
    pub fn new() -> Self {
        Self::with_model(EmbeddingModel::AllMiniLML6V2)
    }

    pub fn with_model(kind: EmbeddingModel) -> Self {
        Self {
            model: Arc::new(Mutex::new(None)),
            kind,
        }
    }

    async fn take_model(&self, guard: &mut Option<TextEmbedding>) -> Result<TextEmbedding> {
        if let Some(model) = guard.take() {
            return Ok(model);
        }

        info!(model = ?self.kind, "Initializing fastembed model...");
        let mut options = InitOptions::new(self.kind.clone());
        options.show_download_progress = true;

        tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?
            .map_err(|e| Error::Embedding(e.to_string()))
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model_guard = self.model.lock().await;
        let mut owned_model = self.take_model(&mut model_guard).await?;

        let (embeddings_res, returned_model) = tokio::task::spawn_blocking(move || {
            let res = owned_model.embed(texts, None);
            (res, owned_model)
        })
        .await
        .map_err(|e| Error::Embedding(e.to_string()))?;

        // Put the model back
        *model_guard = Some(returned_model);
        embeddings_res.map_err(|e| Error::Embedding(e.to_string()))
    }
}
