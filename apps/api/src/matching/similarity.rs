use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_EXCELLENT_MATCH, DEFAULT_PARTIAL_MATCH};
use crate::embedding::{cosine_similarity, Embedder, EmbeddingError};

/// Categorical label derived from the similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(rename = "Excellent Match")]
    Excellent,
    #[serde(rename = "Partial Match")]
    Partial,
    #[serde(rename = "Low Match")]
    Low,
}

/// Score bands. Each lower bound is inclusive: `score >= excellent` is
/// Excellent, `partial <= score < excellent` is Partial, anything below is Low.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchBands {
    pub excellent: f64,
    pub partial: f64,
}

impl Default for MatchBands {
    fn default() -> Self {
        Self {
            excellent: DEFAULT_EXCELLENT_MATCH,
            partial: DEFAULT_PARTIAL_MATCH,
        }
    }
}

impl MatchBands {
    pub fn new(excellent: f64, partial: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&partial) || !(0.0..=100.0).contains(&excellent) {
            bail!("match thresholds must lie within [0, 100] (excellent={excellent}, partial={partial})");
        }
        if partial > excellent {
            bail!("PARTIAL_MATCH_THRESHOLD ({partial}) must not exceed EXCELLENT_MATCH_THRESHOLD ({excellent})");
        }
        Ok(Self { excellent, partial })
    }

    pub fn classify(&self, score: f64) -> MatchStatus {
        if score >= self.excellent {
            MatchStatus::Excellent
        } else if score >= self.partial {
            MatchStatus::Partial
        } else {
            MatchStatus::Low
        }
    }
}

/// Semantic similarity of two documents on a 0–100 scale, rounded to two
/// decimals. Returns 0.0 without touching the embedder when either text is
/// blank.
pub async fn similarity_score(
    embedder: &dyn Embedder,
    text_a: &str,
    text_b: &str,
) -> Result<f64, EmbeddingError> {
    if text_a.trim().is_empty() || text_b.trim().is_empty() {
        return Ok(0.0);
    }

    let vectors = embedder
        .embed(&[text_a.to_string(), text_b.to_string()])
        .await?;
    let [a, b] = vectors.as_slice() else {
        return Err(EmbeddingError::CountMismatch {
            expected: 2,
            got: vectors.len(),
        });
    };

    let cosine = cosine_similarity(a, b);
    if !cosine.is_finite() {
        return Err(EmbeddingError::NonFinite);
    }
    Ok(to_percentage(cosine))
}

/// Scales a cosine similarity to a percentage with two-decimal rounding.
/// Anti-correlated documents score 0.
pub fn to_percentage(cosine: f32) -> f64 {
    let pct = f64::from(cosine.clamp(0.0, 1.0)) * 100.0;
    (pct * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::matching::skills::tests::FixedEmbedder;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_classification_boundaries() {
        let bands = MatchBands::default();
        assert_eq!(bands.classify(100.0), MatchStatus::Excellent);
        assert_eq!(bands.classify(85.0), MatchStatus::Excellent);
        assert_eq!(bands.classify(84.99), MatchStatus::Partial);
        assert_eq!(bands.classify(65.0), MatchStatus::Partial);
        assert_eq!(bands.classify(64.99), MatchStatus::Low);
        assert_eq!(bands.classify(0.0), MatchStatus::Low);
    }

    #[test]
    fn test_status_serializes_as_labels() {
        assert_eq!(
            serde_json::to_value(MatchStatus::Excellent).unwrap(),
            "Excellent Match"
        );
        assert_eq!(serde_json::to_value(MatchStatus::Partial).unwrap(), "Partial Match");
        assert_eq!(serde_json::to_value(MatchStatus::Low).unwrap(), "Low Match");
    }

    #[test]
    fn test_bands_validation() {
        assert!(MatchBands::new(90.0, 70.0).is_ok());
        assert!(MatchBands::new(70.0, 70.0).is_ok());
        assert!(MatchBands::new(60.0, 70.0).is_err());
        assert!(MatchBands::new(120.0, 70.0).is_err());
    }

    #[test]
    fn test_percentage_rounds_to_two_decimals() {
        assert_eq!(to_percentage(1.0), 100.0);
        assert_eq!(to_percentage(0.0), 0.0);
        let pct = to_percentage(0.123456);
        assert!((pct - 12.35).abs() < 1e-9, "got {pct}");
        assert_eq!(to_percentage(-0.4), 0.0);
        assert_eq!(to_percentage(1.0000001), 100.0);
    }

    #[tokio::test]
    async fn test_blank_inputs_score_zero_without_embedding() {
        let embedder = FixedEmbedder::new(&[], vec![1.0]);
        assert_eq!(similarity_score(&embedder, "python", "").await.unwrap(), 0.0);
        assert_eq!(similarity_score(&embedder, "", "python").await.unwrap(), 0.0);
        assert_eq!(similarity_score(&embedder, "  ", "\n").await.unwrap(), 0.0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_score_is_symmetric() {
        let embedder = HashEmbedder::default();
        let long_resume = "Backend engineer shipping Rust and Python services. ".repeat(200);
        let pairs = [
            (
                "Experienced Python developer. Built REST APIs.",
                "Looking for a Python developer with Docker and AWS experience",
            ),
            ("Ingénieur logiciel, expérience Kubernetes à Zürich", "Kubernetes engineer in Zürich"),
            ("数据科学家，熟悉 pandas 和 numpy", "Data scientist with pandas and numpy"),
            (long_resume.as_str(), "Rust backend engineer"),
            ("React frontend", "registered nurse, intensive care"),
        ];

        for (a, b) in pairs {
            let ab = similarity_score(&embedder, a, b).await.unwrap();
            let ba = similarity_score(&embedder, b, a).await.unwrap();
            assert!((ab - ba).abs() < 1e-9, "asymmetric for {b:?}: {ab} vs {ba}");
            assert!((0.0..=100.0).contains(&ab), "out of range for {b:?}: {ab}");
        }
    }

    #[tokio::test]
    async fn test_nan_embedding_is_an_error() {
        let embedder = FixedEmbedder::new(&[], vec![f32::NAN, 1.0]);
        let err = similarity_score(&embedder, "python", "docker").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::NonFinite));
    }

    #[tokio::test]
    async fn test_identical_texts_score_100() {
        let embedder = HashEmbedder::default();
        let text = "Rust engineer with Kubernetes experience";
        assert_eq!(similarity_score(&embedder, text, text).await.unwrap(), 100.0);
    }
}
