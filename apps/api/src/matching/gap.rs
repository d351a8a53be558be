use crate::matching::skills::SkillSet;

/// JD skills absent from the résumé (set difference), in the same sorted
/// order the extractor produces. No skill appears twice.
pub fn missing_skills(jd_skills: &SkillSet, resume_skills: &SkillSet) -> Vec<String> {
    jd_skills.difference(resume_skills).cloned().collect()
}
