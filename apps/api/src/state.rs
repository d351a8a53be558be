use std::sync::Arc;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::matching::skills::SkillIndex;
use crate::rewrite::RewriteAdvisor;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Sentence embedder used for document-level similarity.
    pub embedder: Arc<dyn Embedder>,
    /// Vocabulary plus precomputed skill embeddings.
    pub skills: Arc<SkillIndex>,
    /// Pluggable rewrite advisor. Default: `LlmRewriteAdvisor`.
    pub advisor: Arc<dyn RewriteAdvisor>,
}
