use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

use super::{Embedder, EmbeddingError};

const MODEL_LABEL: &str = "all-MiniLM-L6-v2";

/// In-process all-MiniLM-L6-v2 sentence embedder (ONNX via fastembed).
///
/// Weights are fetched into the cache directory on first start and loaded
/// once; inference runs on the blocking pool so requests never wait on the
/// network.
#[derive(Clone)]
pub struct LocalEmbedder {
    model: Arc<TextEmbedding>,
}

impl LocalEmbedder {
    /// Loads the model. Blocking: call from `spawn_blocking` inside a runtime.
    pub fn load(cache_dir: Option<PathBuf>) -> Result<Self, EmbeddingError> {
        let mut options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::Model(format!("loading {MODEL_LABEL}: {e}")))?;
        info!("Loaded local embedding model {MODEL_LABEL}");

        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let batch = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || model.embed(batch, None))
            .await
            .map_err(|e| EmbeddingError::Model(format!("inference aborted: {e}")))?
            .map_err(|e| EmbeddingError::Model(e.to_string()))?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }
        debug!("Embedded {} texts locally", texts.len());
        Ok(vectors)
    }

    fn name(&self) -> &str {
        MODEL_LABEL
    }
}
