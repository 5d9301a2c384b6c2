use super::state::AppState;
use crate::error::{RecorderError, RecorderResult};
use crate::recording::{RecorderSnapshot, RecordingState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub state: RecordingState,
}

fn status_for(error: &RecorderError) -> StatusCode {
    match error {
        RecorderError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        RecorderError::Device(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RecorderError::Upload(_) => StatusCode::BAD_GATEWAY,
        RecorderError::InvalidTransition { .. }
        | RecorderError::Busy { .. }
        | RecorderError::NoArtifact
        | RecorderError::Discarded => StatusCode::CONFLICT,
        RecorderError::TooShort { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Snapshot on success, `{error, state}` with a mapped status on failure
fn respond<T>(state: &AppState, action: &str, result: RecorderResult<T>) -> Response {
    let snapshot = state.controller.snapshot();
    match result {
        Ok(_) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => {
            warn!("{} failed: {}", action, e);
            (
                status_for(&e),
                Json(ErrorResponse {
                    error: e.to_string(),
                    state: snapshot.state,
                }),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /recording
/// Current recorder snapshot
pub async fn get_status(State(state): State<AppState>) -> Json<RecorderSnapshot> {
    Json(state.controller.snapshot())
}

/// POST /recording/permission
pub async fn request_permission(State(state): State<AppState>) -> impl IntoResponse {
    let result = state.controller.request_permission().await;
    respond(&state, "Permission request", result)
}

/// POST /recording/start
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    info!("Start requested over HTTP");
    let result = state.controller.start_recording().await;
    respond(&state, "Start", result)
}

/// POST /recording/stop
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    info!("Stop requested over HTTP");
    let result = state.controller.stop_recording().await;
    respond(&state, "Stop", result)
}

/// POST /recording/upload
pub async fn upload_recording(State(state): State<AppState>) -> impl IntoResponse {
    let result = state.controller.upload().await;
    respond(&state, "Upload", result)
}

/// POST /recording/retry
pub async fn retry_upload(State(state): State<AppState>) -> impl IntoResponse {
    let result = state.controller.retry().await;
    respond(&state, "Retry", result)
}

/// POST /recording/reset
pub async fn reset_recording(State(state): State<AppState>) -> impl IntoResponse {
    state.controller.reset().await;
    respond(&state, "Reset", Ok(()))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
