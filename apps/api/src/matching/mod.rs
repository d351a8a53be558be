// Résumé ↔ JD matching engine.
// Implements: skill vocabulary, hybrid skill extraction, similarity scoring,
// gap analysis, and the /match_jd pipeline that ties them to the rewrite advisor.

pub mod analyzer;
pub mod gap;
pub mod handlers;
pub mod similarity;
pub mod skills;
pub mod vocabulary;
