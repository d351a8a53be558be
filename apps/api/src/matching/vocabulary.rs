use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

/// Built-in skill list, used unless `SKILLS_FILE` points elsewhere.
pub const DEFAULT_SKILLS: &[&str] = &[
    "python", "java", "c++", "flask", "django", "machine learning",
    "deep learning", "nlp", "tensorflow", "pytorch", "data science",
    "sql", "mysql", "mongodb", "react", "node.js", "express",
    "html", "css", "javascript", "typescript", "docker", "kubernetes",
    "aws", "azure", "cloud", "api", "rest", "fastapi", "git",
    "data analysis", "pandas", "numpy", "matplotlib", "openai", "streamlit",
    "opencv", "transformers", "scikit-learn", "tailwind", "postman",
];

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("Failed to read skills file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Skill vocabulary is empty")]
    Empty,
}

/// Ordered, lowercase, deduplicated list of recognised skills.
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillVocabulary {
    skills: Vec<String>,
}

impl SkillVocabulary {
    /// Normalises entries: trims, lowercases, drops blanks and keeps the first
    /// occurrence of each duplicate.
    pub fn new<I, S>(entries: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let skills: Vec<String> = entries
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.clone()))
            .collect();

        if skills.is_empty() {
            return Err(VocabularyError::Empty);
        }
        Ok(Self { skills })
    }

    pub fn builtin() -> Self {
        Self {
            skills: DEFAULT_SKILLS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// One skill per line; lines starting with `#` are comments.
    pub fn from_file(path: &Path) -> Result<Self, VocabularyError> {
        let raw = std::fs::read_to_string(path).map_err(|source| VocabularyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::new(raw.lines().filter(|line| !line.trim_start().starts_with('#')))
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
