//! Sentence embeddings: the vector space shared by similarity scoring and
//! semantic skill matching.
//!
//! `AppState` holds an `Arc<dyn Embedder>` chosen at startup via `EMBEDDING_BACKEND`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, EmbeddingBackend};

pub mod hash;
pub mod http;
pub mod local;

pub use hash::HashEmbedder;
pub use http::HttpEmbedder;
pub use local::LocalEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding API returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error("Embedding model error: {0}")]
    Model(String),

    #[error("Embedding produced a non-finite similarity")]
    NonFinite,
}

/// Converts text into fixed-length vectors. Implementations must be safe to
/// share across concurrent requests and must not mutate state after construction.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds every input, preserving order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Backend label for logs.
    fn name(&self) -> &str;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            got: 0,
        })
    }
}

/// Constructs the embedder selected by configuration. The local backend
/// loads its model here, once per process.
pub async fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    Ok(match config.embedding_backend {
        EmbeddingBackend::Local => {
            let cache_dir = config.embedding_cache_dir.clone();
            let embedder = tokio::task::spawn_blocking(move || LocalEmbedder::load(cache_dir))
                .await
                .map_err(|e| EmbeddingError::Model(format!("model loader aborted: {e}")))??;
            Arc::new(embedder)
        }
        EmbeddingBackend::Http => Arc::new(HttpEmbedder::new(
            config.embedding_api_url.clone(),
            config.embedding_model.clone(),
            config.embedding_api_key.clone(),
        )?),
        EmbeddingBackend::Hash => Arc::new(HashEmbedder::default()),
    })
}

/// Cosine similarity of two vectors. Returns 0.0 when the lengths differ,
/// either vector is empty, or either has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
