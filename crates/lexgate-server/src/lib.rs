//! lexgate Server
//!
//! HTTP gateway in front of the extraction engine. Accepts extraction
//! requests, resolves the provider credential, runs the backend once per
//! document and returns JSON, optionally persisting a JSONL file and an HTML
//! report per call.
//!
//! ```text
//! request → schema → credential → normalize → backend → (artifacts) → JSON
//! ```

#![warn(missing_docs)]

pub mod artifacts;
pub mod auth;
pub mod config;
pub mod handlers;
pub mod invoke;
pub mod normalize;
pub mod request;
pub mod serialize;

use artifacts::ArtifactStore;
use config::ServerConfig;
use handlers::{create_router, AppState};
use lexgate_extractor::Extractor;
use lexgate_llm::DefaultProviderFactory;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Model provider setup failed
    #[error("Provider setup failed: {0}")]
    Provider(#[from] lexgate_llm::LlmError),

    /// Artifacts directory could not be prepared
    #[error("Artifacts directory error: {0}")]
    Artifacts(std::io::Error),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build application state backed by the real extraction engine
pub fn build_state(config: ServerConfig) -> Result<AppState, ServerError> {
    config.validate()?;

    let artifacts = ArtifactStore::open(&config.artifacts_dir).map_err(ServerError::Artifacts)?;
    let factory = DefaultProviderFactory::new(config.providers.clone())?;
    let backend = Extractor::new(factory, config.extractor.clone());

    Ok(AppState::new(config, Arc::new(backend), artifacts))
}

/// Start the HTTP server
///
/// Prepares the artifacts root, wires the extraction engine and serves
/// until the process is stopped.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting lexgate server");
    info!("Bind address: {}", config.bind_addr());
    info!("Default model: {}", config.model_id);
    info!(
        "Server credential: {}",
        if config.client_api_key.is_some() { "configured" } else { "none" }
    );
    if config.allow_missing_credentials {
        warn!("Missing credentials and examples are allowed; do not use in production");
    }

    let bind_addr = config.bind_addr();
    let state = build_state(config)?;
    info!("Artifacts directory: {}", state.artifacts.root().display());

    let app = create_router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("lexgate listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
