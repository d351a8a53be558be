mod config;
mod document;
mod embedding;
mod errors;
mod llm_client;
mod matching;
mod rewrite;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::build_embedder;
use crate::llm_client::LlmClient;
use crate::matching::skills::SkillIndex;
use crate::matching::vocabulary::SkillVocabulary;
use crate::rewrite::LlmRewriteAdvisor;
use crate::routes::{build_router, panic_response};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing GEMINI_API_KEY)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jdmatch API v{}", env!("CARGO_PKG_VERSION"));

    let vocabulary = match &config.skills_file {
        Some(path) => SkillVocabulary::from_file(path)
            .with_context(|| format!("loading skill vocabulary from {}", path.display()))?,
        None => SkillVocabulary::builtin(),
    };
    info!("Skill vocabulary loaded ({} skills)", vocabulary.len());

    // Embed the vocabulary up front so an unreachable model fails startup
    let embedder = build_embedder(&config).await?;
    let skills = SkillIndex::build(Arc::new(vocabulary), embedder.clone(), config.skill_threshold)
        .await
        .with_context(|| format!("embedding skill vocabulary with '{}'", embedder.name()))?;

    let llm = LlmClient::new(config.gemini_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let advisor = Arc::new(LlmRewriteAdvisor::new(llm, config.resume_prompt_chars));

    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        embedder,
        skills: Arc::new(skills),
        advisor,
    };

    let app = build_router(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
