//! Rewrite Advisor: asks the generative model for JD-aligned résumé rewrites.
//!
//! This is a best-effort boundary. `suggest_rewrites` never fails: provider
//! errors, timeouts and unparseable output all degrade to a fallback payload
//! with an explanatory summary and an empty entry list, so the match result is
//! always returned.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::prompts::{render, JSON_ONLY_SYSTEM, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};

pub mod prompts;

use prompts::{REPLACEMENTS_PROMPT_TEMPLATE, SECTIONS_PROMPT_TEMPLATE};

const NO_SUMMARY: &str = "No summary provided.";
const PARSE_FAILURE_SUMMARY: &str = "Failed to parse AI output";

/// Which response shape the generative model is asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteTemplate {
    /// Whole-section rewrites, returned under `sections`.
    #[default]
    Sections,
    /// Phrase-level swaps, returned under `replacements`.
    Replacements,
}

impl FromStr for RewriteTemplate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sections" => Ok(Self::Sections),
            "replacements" => Ok(Self::Replacements),
            other => anyhow::bail!(
                "unknown rewrite template '{other}' (expected 'sections' or 'replacements')"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionRewrite {
    #[serde(default)]
    pub section_name: String,
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub rewritten_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhraseReplacement {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub original_phrase: String,
    #[serde(default)]
    pub suggested_phrase: String,
}

/// Rewrite records, serialized under the key matching the template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteEntries {
    Sections(Vec<SectionRewrite>),
    Replacements(Vec<PhraseReplacement>),
}

impl RewriteEntries {
    pub fn empty(template: RewriteTemplate) -> Self {
        match template {
            RewriteTemplate::Sections => Self::Sections(Vec::new()),
            RewriteTemplate::Replacements => Self::Replacements(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Sections(v) => v.len(),
            Self::Replacements(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Advisor result: a summary plus the rewrite records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewriteOutput {
    pub summary: String,
    #[serde(flatten)]
    pub entries: RewriteEntries,
}

impl RewriteOutput {
    pub fn fallback(template: RewriteTemplate, summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            entries: RewriteEntries::empty(template),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("model output was not valid JSON")]
    Malformed,
}

pub struct RewriteRequest<'a> {
    pub resume_text: &'a str,
    pub jd_text: &'a str,
    pub missing_skills: &'a [String],
    pub template: RewriteTemplate,
}

/// A source of rewrite suggestions. `AppState` carries an `Arc<dyn RewriteAdvisor>`.
#[async_trait]
pub trait RewriteAdvisor: Send + Sync {
    async fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<RewriteOutput, AdvisorError>;
}

/// Production advisor backed by the shared `LlmClient`.
pub struct LlmRewriteAdvisor {
    llm: LlmClient,
    resume_prompt_chars: usize,
}

impl LlmRewriteAdvisor {
    pub fn new(llm: LlmClient, resume_prompt_chars: usize) -> Self {
        Self {
            llm,
            resume_prompt_chars,
        }
    }
}

#[async_trait]
impl RewriteAdvisor for LlmRewriteAdvisor {
    async fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<RewriteOutput, AdvisorError> {
        let prompt = build_prompt(request, self.resume_prompt_chars);
        let raw = self.llm.call_text(&prompt, JSON_ONLY_SYSTEM).await?;
        debug!("Rewrite advisor returned {} chars", raw.len());
        parse_rewrite_output(&raw, request.template)
    }
}

/// Renders the template prompt. The résumé is cut to its first `max_resume_chars` characters.
pub fn build_prompt(request: &RewriteRequest<'_>, max_resume_chars: usize) -> String {
    let template = match request.template {
        RewriteTemplate::Sections => SECTIONS_PROMPT_TEMPLATE,
        RewriteTemplate::Replacements => REPLACEMENTS_PROMPT_TEMPLATE,
    };
    let missing = if request.missing_skills.is_empty() {
        "(none)".to_string()
    } else {
        request.missing_skills.join(", ")
    };

    render(
        template,
        &[
            ("no_fabrication", NO_FABRICATION_INSTRUCTION),
            ("jd_text", request.jd_text),
            ("resume_text", truncate_chars(request.resume_text, max_resume_chars)),
            ("missing_skills", missing.as_str()),
        ],
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[derive(Debug, Deserialize)]
struct SectionsPayload {
    summary: Option<String>,
    sections: Option<Vec<SectionRewrite>>,
}

#[derive(Debug, Deserialize)]
struct ReplacementsPayload {
    summary: Option<String>,
    replacements: Option<Vec<PhraseReplacement>>,
}

/// Tolerant parse of raw model output: strict JSON first, then the outermost
/// `{...}` span within the text.
pub fn parse_rewrite_output(
    raw: &str,
    template: RewriteTemplate,
) -> Result<RewriteOutput, AdvisorError> {
    let text = strip_json_fences(raw);

    if let Some(output) = parse_json(text, template) {
        return Ok(output);
    }

    let start = text.find('{');
    let end = text.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            if let Some(output) = parse_json(&text[start..=end], template) {
                return Ok(output);
            }
        }
    }

    Err(AdvisorError::Malformed)
}

fn parse_json(text: &str, template: RewriteTemplate) -> Option<RewriteOutput> {
    let (summary, entries) = match template {
        RewriteTemplate::Sections => {
            let payload: SectionsPayload = serde_json::from_str(text).ok()?;
            (
                payload.summary,
                RewriteEntries::Sections(payload.sections.unwrap_or_default()),
            )
        }
        RewriteTemplate::Replacements => {
            let payload: ReplacementsPayload = serde_json::from_str(text).ok()?;
            (
                payload.summary,
                RewriteEntries::Replacements(payload.replacements.unwrap_or_default()),
            )
        }
    };

    Some(RewriteOutput {
        summary: summary.unwrap_or_else(|| NO_SUMMARY.to_string()),
        entries,
    })
}

/// Calls the advisor under a time bound and converts every failure into the
/// fallback payload.
pub async fn suggest_rewrites(
    advisor: &dyn RewriteAdvisor,
    request: &RewriteRequest<'_>,
    timeout: Duration,
) -> RewriteOutput {
    let result = tokio::time::timeout(timeout, advisor.rewrite(request))
        .await
        .unwrap_or(Err(AdvisorError::Timeout(timeout)));

    match result {
        Ok(output) => output,
        Err(AdvisorError::Malformed) => {
            warn!("Rewrite advisor returned unparseable output");
            RewriteOutput::fallback(request.template, PARSE_FAILURE_SUMMARY)
        }
        Err(e) => {
            warn!("Rewrite advisor failed: {e}");
            RewriteOutput::fallback(
                request.template,
                format!("Error generating AI suggestion: {e}"),
            )
        }
    }
}
