//! API routes
//!
//! - `GET  /health`
//! - `POST /v1/sessions`
//! - `GET  /v1/sessions/:id`
//! - `POST /v1/sessions/:id/submit`
//! - `GET  /v1/sessions/:id/image`

use crate::session::{SessionId, SessionView, Submission};
use crate::{Error, Study};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

type StudyArc = Arc<Study>;
type ApiResult<T> = std::result::Result<T, (StatusCode, String)>;

/// Participant action kinds accepted by the submit route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Welcome screen name
    Name,
    /// Guessing-phase selection
    Guess,
    /// Treatment choice
    Teaching,
    /// "Proceed to testing"
    Proceed,
    /// Testing-phase selection
    TestAnswer,
}

/// Body of `POST /v1/sessions/:id/submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// What the participant did
    pub action: Action,
    /// Submitted value; missing counts as empty
    #[serde(default)]
    pub value: Option<String>,
}

impl From<SubmitRequest> for Submission {
    fn from(req: SubmitRequest) -> Self {
        let value = req.value.unwrap_or_default();
        match req.action {
            Action::Name => Self::Name(value),
            Action::Guess => Self::Guess(value),
            Action::Teaching => Self::Teaching(value),
            Action::Proceed => Self::ProceedToTesting,
            Action::TestAnswer => Self::TestAnswer(value),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Live sessions
    pub sessions: usize,
}

fn error_status(e: &Error) -> StatusCode {
    match e {
        Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(e: Error) -> (StatusCode, String) {
    let status = error_status(&e);
    if status.is_server_error() {
        error!("  Request failed: {}", e);
    }
    (status, e.to_string())
}

/// Run blocking study work off the async executor.
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> crate::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(api_error)
}

// ============================================================================
// Health Routes
// ============================================================================

/// Liveness route
pub fn health_routes() -> Router<StudyArc> {
    Router::new().route("/health", get(health))
}

async fn health(State(study): State<StudyArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: study.sessions().len(),
    })
}

// ============================================================================
// Session Routes
// ============================================================================

/// Session lifecycle routes
pub fn session_routes() -> Router<StudyArc> {
    Router::new()
        .route("/v1/sessions", post(start_session))
        .route("/v1/sessions/:id", get(get_session))
        .route("/v1/sessions/:id/submit", post(submit))
        .route("/v1/sessions/:id/image", get(current_image))
}

async fn start_session(State(study): State<StudyArc>) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let view = blocking(move || Ok(study.start_session())).await?;
    info!("  Session created: {}", view.session_id);
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_session(
    State(study): State<StudyArc>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionView>> {
    blocking(move || study.view(&id)).await.map(Json)
}

async fn submit(
    State(study): State<StudyArc>,
    Path(id): Path<SessionId>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<Json<SessionView>> {
    let submission = Submission::from(req);
    blocking(move || study.submit(&id, submission)).await.map(Json)
}

async fn current_image(
    State(study): State<StudyArc>,
    Path(id): Path<SessionId>,
) -> ApiResult<Response> {
    let path = blocking(move || study.current_image(&id))
        .await?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No image on screen".to_string()))?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        error!("  Cannot read image {}: {}", path.display(), e);
        (StatusCode::NOT_FOUND, format!("Image unavailable: {e}"))
    })?;

    Ok(([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response())
}

/// MIME type by file extension.
#[must_use]
pub fn content_type(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
