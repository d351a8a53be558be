use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::matching::similarity::MatchBands;
use crate::rewrite::RewriteTemplate;

/// Semantic-phase cutoff for skill extraction. A skill matches when its
/// cosine similarity to the document is strictly greater than this.
pub const DEFAULT_SKILL_THRESHOLD: f32 = 0.65;
pub const DEFAULT_EXCELLENT_MATCH: f64 = 85.0;
pub const DEFAULT_PARTIAL_MATCH: f64 = 65.0;
/// Résumé prefix (in characters) forwarded to the generative provider.
pub const DEFAULT_RESUME_PROMPT_CHARS: usize = 4000;
pub const DEFAULT_ADVISOR_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_EMBEDDING_API_URL: &str = "http://localhost:8081/v1/embeddings";
const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Which embedding implementation backs similarity scoring and skill extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// In-process all-MiniLM-L6-v2.
    Local,
    /// OpenAI-compatible `/v1/embeddings` endpoint.
    Http,
    /// Offline feature-hashing embedder. Deterministic, no model download.
    Hash,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "http" => Ok(Self::Http),
            "hash" => Ok(Self::Hash),
            other => bail!("unknown embedding backend '{other}' (expected 'local', 'http' or 'hash')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if the provider secret is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_api_url: String,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub embedding_cache_dir: Option<PathBuf>,
    pub skills_file: Option<PathBuf>,
    pub skill_threshold: f32,
    pub match_bands: MatchBands,
    pub resume_prompt_chars: usize,
    pub advisor_timeout: Duration,
    pub rewrite_template: RewriteTemplate,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let skill_threshold: f32 = parse_or(&lookup, "SKILL_SIMILARITY_THRESHOLD", DEFAULT_SKILL_THRESHOLD)?;
        if !(0.0..=1.0).contains(&skill_threshold) {
            bail!("SKILL_SIMILARITY_THRESHOLD must be within [0, 1], got {skill_threshold}");
        }

        let match_bands = MatchBands::new(
            parse_or(&lookup, "EXCELLENT_MATCH_THRESHOLD", DEFAULT_EXCELLENT_MATCH)?,
            parse_or(&lookup, "PARTIAL_MATCH_THRESHOLD", DEFAULT_PARTIAL_MATCH)?,
        )?;

        Ok(Config {
            gemini_api_key: lookup("GEMINI_API_KEY")
                .context("Required environment variable 'GEMINI_API_KEY' is not set")?,
            port: parse_or(&lookup, "PORT", 8080u16)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            embedding_backend: parse_or(&lookup, "EMBEDDING_BACKEND", EmbeddingBackend::Local)?,
            embedding_api_url: lookup("EMBEDDING_API_URL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_API_URL.to_string()),
            embedding_model: lookup("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_api_key: lookup("EMBEDDING_API_KEY"),
            embedding_cache_dir: lookup("EMBEDDING_CACHE_DIR").map(PathBuf::from),
            skills_file: lookup("SKILLS_FILE").map(PathBuf::from),
            skill_threshold,
            match_bands,
            resume_prompt_chars: parse_or(&lookup, "RESUME_PROMPT_CHARS", DEFAULT_RESUME_PROMPT_CHARS)?,
            advisor_timeout: Duration::from_secs(parse_or(
                &lookup,
                "ADVISOR_TIMEOUT_SECS",
                DEFAULT_ADVISOR_TIMEOUT_SECS,
            )?),
            rewrite_template: parse_or(&lookup, "REWRITE_TEMPLATE", RewriteTemplate::Sections)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "GEMINI_API_KEY" => Some("test-key".to_string()),
        "EMBEDDING_BACKEND" => Some("hash".to_string()),
        _ => None,
    })
    .expect("test config must load")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        assert!(load(&[("GEMINI_API_KEY", "   ")]).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("GEMINI_API_KEY", "k")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.embedding_backend, EmbeddingBackend::Local);
        assert!(config.embedding_cache_dir.is_none());
        assert!((config.skill_threshold - 0.65).abs() < f32::EPSILON);
        assert_eq!(config.match_bands.excellent, 85.0);
        assert_eq!(config.match_bands.partial, 65.0);
        assert_eq!(config.resume_prompt_chars, 4000);
        assert_eq!(config.advisor_timeout, Duration::from_secs(30));
        assert_eq!(config.rewrite_template, RewriteTemplate::Sections);
        assert!(config.skills_file.is_none());
        assert!(config.embedding_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("GEMINI_API_KEY", "k"),
            ("PORT", "9000"),
            ("EMBEDDING_BACKEND", "HASH"),
            ("SKILL_SIMILARITY_THRESHOLD", "0.8"),
            ("REWRITE_TEMPLATE", "replacements"),
            ("ADVISOR_TIMEOUT_SECS", "5"),
            ("SKILLS_FILE", "/etc/skills.txt"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.embedding_backend, EmbeddingBackend::Hash);
        assert!((config.skill_threshold - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.rewrite_template, RewriteTemplate::Replacements);
        assert_eq!(config.advisor_timeout, Duration::from_secs(5));
        assert_eq!(config.skills_file, Some(PathBuf::from("/etc/skills.txt")));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = load(&[("GEMINI_API_KEY", "k"), ("PORT", "not-a-port")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        assert!(load(&[("GEMINI_API_KEY", "k"), ("SKILL_SIMILARITY_THRESHOLD", "1.5")]).is_err());
    }

    #[test]
    fn test_inverted_bands_are_rejected() {
        assert!(load(&[
            ("GEMINI_API_KEY", "k"),
            ("EXCELLENT_MATCH_THRESHOLD", "60"),
            ("PARTIAL_MATCH_THRESHOLD", "70"),
        ])
        .is_err());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(load(&[("GEMINI_API_KEY", "k"), ("EMBEDDING_BACKEND", "onnx")]).is_err());
    }

    #[test]
    fn test_remote_backends_are_opt_in() {
        let config = load(&[
            ("GEMINI_API_KEY", "k"),
            ("EMBEDDING_BACKEND", "http"),
            ("EMBEDDING_CACHE_DIR", "/var/cache/jdmatch"),
        ])
        .unwrap();
        assert_eq!(config.embedding_backend, EmbeddingBackend::Http);
        assert_eq!(config.embedding_cache_dir, Some(PathBuf::from("/var/cache/jdmatch")));
        assert_eq!("Local".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Local);
    }
}
