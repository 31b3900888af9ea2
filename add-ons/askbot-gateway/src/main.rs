//! Axum-based gateway for askbot. Config-driven via CoreConfig.

mod error;
mod handlers;

use askbot_core::{AnswerResolver, CoreConfig, KnowledgeStore, LocalMatcher};
use askbot_skills::{http_client, GeminiGenerator, SpeechClient};
use axum::http::Method;
use axum::{routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const GENERATION_KEY_VAR: &str = "ASKBOT__GENERATION__API_KEY";
const SPEECH_KEY_VAR: &str = "ASKBOT__SPEECH__API_KEY";

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("{capability} is enabled but {var} is not set")]
    MissingCredential {
        capability: &'static str,
        var: &'static str,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Enabled capabilities whose API key is absent, as (capability, env var).
fn missing_credentials(config: &CoreConfig) -> Vec<(&'static str, &'static str)> {
    let has_key = |key: &Option<String>| key.as_deref().is_some_and(|k| !k.trim().is_empty());
    let mut missing = Vec::new();
    if config.generation.enabled && !has_key(&config.generation.api_key) {
        missing.push(("generation", GENERATION_KEY_VAR));
    }
    if config.speech.enabled && !has_key(&config.speech.api_key) {
        missing.push(("speech", SPEECH_KEY_VAR));
    }
    missing
}

/// Pre-flight check: config, knowledge file, credentials, and port.
async fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking knowledge base {}... ", config.knowledge_path);
    let store = KnowledgeStore::try_load(&config.knowledge_path)
        .await
        .map_err(|e| format!("knowledge base unusable: {}", e))?;
    println!("OK ({} categories)", store.len());

    print!("Checking credentials... ");
    if let Some((capability, var)) = missing_credentials(&config).into_iter().next() {
        return Err(format!("{} is enabled but {} is not set", capability, var));
    }
    println!(
        "OK (generation {}, speech {})",
        if config.generation.enabled { "on" } else { "off" },
        if config.speech.enabled { "on" } else { "off" }
    );

    let port = config.port;
    print!("Checking port {}... ", port);
    match std::net::TcpListener::bind((config.host.as_str(), port)) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\nAll checks passed. Ready to start gateway.");
    Ok(())
}

/// Loads the knowledge base (awaited, so no request sees a half-loaded store) and
/// wires the enabled capabilities.
async fn build_resolver(config: &CoreConfig) -> Result<AnswerResolver, StartupError> {
    if let Some((capability, var)) = missing_credentials(config).into_iter().next() {
        return Err(StartupError::MissingCredential { capability, var });
    }

    let store = Arc::new(KnowledgeStore::load_or_empty(&config.knowledge_path).await);
    let mut resolver =
        AnswerResolver::new(LocalMatcher::new(store)).with_call_timeout(config.call_timeout());

    let client = http_client().map_err(|e| StartupError::HttpClient(e.to_string()))?;
    if config.generation.enabled {
        if let Some(generator) = GeminiGenerator::from_config(client.clone(), &config.generation) {
            resolver = resolver.with_generator(Arc::new(generator));
        }
    }
    if config.speech.enabled {
        if let Some(speech) = SpeechClient::from_config(client, &config.speech) {
            resolver = resolver.with_synthesizer(Arc::new(speech));
        }
    }
    Ok(resolver)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[askbot-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify().await {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoreConfig::load()?;
    let resolver = Arc::new(build_resolver(&config).await?);
    tracing::info!(
        target: "askbot::gateway",
        generation = resolver.generation_enabled(),
        audio = resolver.audio_enabled(),
        "Answer resolver ready"
    );

    let app = build_app(AppState { resolver });

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("{} listening on {}", config.app_name, listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_app(state: AppState) -> Router {
    // Browser chat UIs are served from arbitrary origins; the API is unauthenticated.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/ask", post(handlers::ask))
        .with_state(state)
        .layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) resolver: Arc<AnswerResolver>,
}
