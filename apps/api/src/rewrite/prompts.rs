// Prompt constants for the rewrite advisor.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Section-by-section rewrite template.
/// Replace: {no_fabrication}, {jd_text}, {resume_text}, {missing_skills}
pub const SECTIONS_PROMPT_TEMPLATE: &str = r#"You are a resume optimization engine.

Your goal: rewrite this candidate's resume so it aligns with the given Job Description (JD).

{no_fabrication}

--- JOB DESCRIPTION ---
{jd_text}

--- CANDIDATE RESUME ---
{resume_text}

--- SKILLS IN THE JD BUT NOT IN THE RESUME ---
{missing_skills}

--- INSTRUCTIONS ---
1. Analyze the job description for keywords, skills and responsibilities.
2. Identify the resume's sections, such as Profile / Summary, Experience, Projects, Skills.
3. Rewrite each section to include key JD terms naturally, use professional,
   metrics-driven language, and emphasize alignment with the role.
4. Do NOT summarize. Provide rewritten text that could replace the original section.

Return a JSON object with this EXACT schema:
{
  "summary": "Brief note about overall JD alignment and changes made.",
  "sections": [
    {
      "section_name": "Profile",
      "original_text": "Original section text from resume",
      "rewritten_text": "Rewritten JD-aligned version"
    }
  ]
}"#;

/// Phrase-level replacement template.
/// Replace: {no_fabrication}, {jd_text}, {resume_text}, {missing_skills}
pub const REPLACEMENTS_PROMPT_TEMPLATE: &str = r#"You are a resume optimization engine.

Your goal: suggest targeted phrase replacements that align this candidate's resume
with the given Job Description (JD) while keeping the rest of the resume untouched.

{no_fabrication}

--- JOB DESCRIPTION ---
{jd_text}

--- CANDIDATE RESUME ---
{resume_text}

--- SKILLS IN THE JD BUT NOT IN THE RESUME ---
{missing_skills}

--- INSTRUCTIONS ---
1. Pick the phrases in the resume that most weaken its fit for this JD.
2. For each, propose a drop-in replacement using the JD's terminology.
3. `original_phrase` must be copied verbatim from the resume.
4. Prefer 3 to 8 high-impact replacements over many cosmetic ones.

Return a JSON object with this EXACT schema:
{
  "summary": "Brief note about overall JD alignment and the replacements proposed.",
  "replacements": [
    {
      "section": "Experience",
      "original_phrase": "Exact phrase from the resume",
      "suggested_phrase": "JD-aligned replacement"
    }
  ]
}"#;
