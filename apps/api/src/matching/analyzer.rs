//! Match pipeline: similarity + skill extraction + gap analysis + rewrite advice.
//!
//! Flow: (similarity ∥ résumé skills ∥ JD skills) → missing skills →
//!       classify → rewrite advisor (never fails) → MatchResult.

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::matching::gap::missing_skills;
use crate::matching::similarity::{similarity_score, MatchStatus};
use crate::rewrite::{suggest_rewrites, RewriteEntries, RewriteRequest};
use crate::state::AppState;

/// The `/match_jd` response body.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// 0–100, two decimals.
    pub similarity: f64,
    pub match_status: MatchStatus,
    pub missing_skills: Vec<String>,
    pub resume_skills: Vec<String>,
    pub jd_skills: Vec<String>,
    pub summary: String,
    /// Serialized as `sections` or `replacements` depending on the template.
    #[serde(flatten)]
    pub rewrites: RewriteEntries,
}

/// Scores a résumé against a job description and collects rewrite suggestions.
///
/// Embedding failures propagate; advisor failures are absorbed into the
/// summary by `suggest_rewrites`.
pub async fn analyze_resume_vs_jd(
    state: &AppState,
    resume_text: &str,
    jd_text: &str,
) -> Result<MatchResult, AppError> {
    let (similarity, resume_skills, jd_skills) = tokio::try_join!(
        similarity_score(state.embedder.as_ref(), resume_text, jd_text),
        state.skills.extract(resume_text),
        state.skills.extract(jd_text),
    )?;

    let missing = missing_skills(&jd_skills, &resume_skills);
    let match_status = state.config.match_bands.classify(similarity);

    info!(
        similarity,
        ?match_status,
        resume_skills = resume_skills.len(),
        jd_skills = jd_skills.len(),
        missing = missing.len(),
        "Scored resume against JD"
    );

    let rewrite = suggest_rewrites(
        state.advisor.as_ref(),
        &RewriteRequest {
            resume_text,
            jd_text,
            missing_skills: &missing,
            template: state.config.rewrite_template,
        },
        state.config.advisor_timeout,
    )
    .await;

    if rewrite.entries.is_empty() {
        debug!("Rewrite advisor produced no entries: {}", rewrite.summary);
    }

    Ok(MatchResult {
        similarity,
        match_status,
        missing_skills: missing,
        resume_skills: resume_skills.into_iter().collect(),
        jd_skills: jd_skills.into_iter().collect(),
        summary: rewrite.summary,
        rewrites: rewrite.entries,
    })
}
