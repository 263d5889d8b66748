//! HTTP request handlers for the extraction gateway.
//!
//! Implements extract, visualize, artifact serving, health and version
//! endpoints using axum.

use crate::artifacts::{ArtifactError, ArtifactStore, RunArtifact};
use crate::auth::{CredentialResolver, MissingCredential};
use crate::config::ServerConfig;
use crate::invoke::invoke;
use crate::normalize::{normalize, CallDefaults, NormalizedCall};
use crate::request::{ExtractionRequest, ValidationError};
use crate::serialize::extract_response;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use lexgate_domain::{BackendError, ExtractionBackend};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Application name reported by `/version`
pub const APP_NAME: &str = "lexgate";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Startup configuration
    pub config: Arc<ServerConfig>,
    /// Credential policy
    pub credentials: CredentialResolver,
    /// Fallbacks for fields a request leaves out
    pub defaults: CallDefaults,
    /// Extraction engine
    pub backend: Arc<dyn ExtractionBackend>,
    /// Artifacts root
    pub artifacts: Arc<ArtifactStore>,
}

impl AppState {
    /// Assemble state from configuration, a backend and an opened store
    pub fn new(
        config: ServerConfig,
        backend: Arc<dyn ExtractionBackend>,
        artifacts: ArtifactStore,
    ) -> Self {
        let credentials = CredentialResolver::new(
            config.client_api_key.clone(),
            config.allow_missing_credentials,
        );
        let defaults = CallDefaults::from_config(&config);
        Self {
            config: Arc::new(config),
            credentials,
            defaults,
            backend,
            artifacts: Arc::new(artifacts),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Current UTC time, RFC 3339
    pub time: String,
}

/// Version response
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    /// Application name
    pub app: String,
    /// Crate version
    pub version: String,
    /// Model used when a request names none
    pub model_default: String,
    /// Canonical artifacts root
    pub artifacts_dir: String,
    /// Whether credential-less requests are accepted
    pub allow_missing_credentials: bool,
}

/// Query for `/artifacts/html`
#[derive(Debug, Deserialize)]
pub struct ArtifactQuery {
    /// Path of a report previously returned by `/visualize`
    pub path: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Request body is malformed or incomplete
    Validation(String),
    /// No provider credential available
    Unauthorized(String),
    /// The extraction backend failed
    Upstream(BackendError),
    /// Writing or reading artifacts failed
    Artifact(ArtifactError),
    /// Internal server error
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Upstream(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            AppError::Artifact(e) => {
                let status = match e {
                    ArtifactError::OutsideRoot => StatusCode::BAD_REQUEST,
                    ArtifactError::NotFound => StatusCode::NOT_FOUND,
                    ArtifactError::Io(_) | ArtifactError::Encode(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            error!("{} {}", status, message);
        } else {
            warn!("{} {}", status, message);
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<MissingCredential> for AppError {
    fn from(e: MissingCredential) -> Self {
        AppError::Unauthorized(e.to_string())
    }
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        AppError::Upstream(e)
    }
}

impl From<ArtifactError> for AppError {
    fn from(e: ArtifactError) -> Self {
        AppError::Artifact(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::InternalError(format!("Failed to serialize results: {}", e))
    }
}

/// Shared front half of `/extract` and `/visualize`:
/// schema, then credential, then normalization
fn prepare(
    state: &AppState,
    headers: &HeaderMap,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<NormalizedCall, AppError> {
    let Json(request) = payload?;
    request.validate()?;

    let api_key = state
        .credentials
        .resolve(request.api_key.as_deref(), headers)?;

    normalize(request, &state.defaults, api_key).map_err(AppError::from)
}

/// POST /extract - Run extraction and return the documents
async fn extract(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let call = prepare(&state, &headers, payload)?;
    let documents = invoke(state.backend.as_ref(), &call).await?;
    Ok(Json(extract_response(&documents, call.single, call.debug)?))
}

/// POST /visualize - Run extraction and persist JSONL plus an HTML report
async fn visualize(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<RunArtifact>, AppError> {
    let call = prepare(&state, &headers, payload)?;
    let documents = invoke(state.backend.as_ref(), &call).await?;
    let artifact = state
        .artifacts
        .write_run(state.backend.as_ref(), &documents, call.debug)
        .await?;
    Ok(Json(artifact))
}

/// GET /artifacts/html - Serve a report written by `/visualize`
async fn artifact_html(
    State(state): State<AppState>,
    Query(query): Query<ArtifactQuery>,
) -> Result<Response, AppError> {
    let path = state.artifacts.resolve_html(&query.path).await?;
    let body = tokio::fs::read(&path).await.map_err(ArtifactError::Io)?;
    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response())
}

/// GET /health - Liveness
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        time: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

/// GET /version - Defaults and configuration summary
async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        app: APP_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_default: state.config.model_id.clone(),
        artifacts_dir: state.artifacts.root().display().to_string(),
        allow_missing_credentials: state.config.allow_missing_credentials,
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/extract", post(extract))
        .route("/visualize", post(visualize))
        .route("/artifacts/html", get(artifact_html))
        .route("/health", get(health_check))
        .route("/version", get(version))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
