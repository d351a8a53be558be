//! Skill extraction: hybrid exact + semantic matching against the vocabulary.
//!
//! Exact phase: case-insensitive literal substring match.
//! Semantic phase: cosine(document, skill) > threshold.
//! The two phases are OR-ed, so a paraphrase ("built ML pipelines") can surface
//! "machine learning" without the phrase appearing verbatim.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::embedding::{cosine_similarity, Embedder, EmbeddingError};
use crate::matching::vocabulary::SkillVocabulary;

/// Skills found in one document. Always a subset of the vocabulary; iterates
/// in lexicographic order.
pub type SkillSet = BTreeSet<String>;

/// The vocabulary together with its precomputed phrase embeddings.
pub struct SkillIndex {
    vocabulary: Arc<SkillVocabulary>,
    skill_embeddings: Vec<Vec<f32>>,
    embedder: Arc<dyn Embedder>,
    threshold: f32,
}

impl SkillIndex {
    /// Embeds every vocabulary phrase once. Called at startup.
    pub async fn build(
        vocabulary: Arc<SkillVocabulary>,
        embedder: Arc<dyn Embedder>,
        threshold: f32,
    ) -> Result<Self, EmbeddingError> {
        debug_assert!(!vocabulary.is_empty());
        let skill_embeddings = embedder.embed(vocabulary.skills()).await?;
        if skill_embeddings.len() != vocabulary.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: vocabulary.len(),
                got: skill_embeddings.len(),
            });
        }

        info!(
            "Skill index ready: {} skills, backend={}, threshold={}",
            vocabulary.len(),
            embedder.name(),
            threshold
        );

        Ok(Self {
            vocabulary,
            skill_embeddings,
            embedder,
            threshold,
        })
    }

    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Extracts every vocabulary skill present in `text`.
    pub async fn extract(&self, text: &str) -> Result<SkillSet, EmbeddingError> {
        if text.trim().is_empty() {
            return Ok(SkillSet::new());
        }

        let text_lower = text.to_lowercase();
        let mut skills = self.exact_matches(text);
        let exact_count = skills.len();

        let document = self.embedder.embed_one(&text_lower).await?;
        skills.extend(self.semantic_matches(&document));
        debug_assert!(skills.iter().all(|s| self.vocabulary.contains(s)));

        debug!(
            "Extracted {} skills ({} exact, {} semantic-only)",
            skills.len(),
            exact_count,
            skills.len() - exact_count
        );
        Ok(skills)
    }

    /// Vocabulary entries occurring as literal substrings of `text`.
    pub fn exact_matches(&self, text: &str) -> SkillSet {
        let text_lower = text.to_lowercase();
        self.vocabulary
            .skills()
            .iter()
            .filter(|skill| text_lower.contains(skill.as_str()))
            .cloned()
            .collect()
    }

    fn semantic_matches<'a>(&'a self, document: &'a [f32]) -> impl Iterator<Item = String> + 'a {
        self.vocabulary
            .skills()
            .iter()
            .zip(&self.skill_embeddings)
            .filter(move |(_, embedding)| cosine_similarity(document, embedding) > self.threshold)
            .map(|(skill, _)| skill.clone())
    }
}
