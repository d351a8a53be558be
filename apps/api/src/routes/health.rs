use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

const GREETING: &str = "Resume ↔ JD Matcher API is running!";

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": GREETING }))
}

/// GET /health
/// Returns a status object with service version and the loaded matching setup.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jdmatch",
        "embedding_backend": state.embedder.name(),
        "skills": state.skills.vocabulary().len(),
        "skill_threshold": state.skills.threshold(),
    }))
}
