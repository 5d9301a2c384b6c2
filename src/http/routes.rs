use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recorder state
        .route("/recording", get(handlers::get_status))
        // Recorder control
        .route("/recording/permission", post(handlers::request_permission))
        .route("/recording/start", post(handlers::start_recording))
        .route("/recording/stop", post(handlers::stop_recording))
        .route("/recording/upload", post(handlers::upload_recording))
        .route("/recording/retry", post(handlers::retry_upload))
        .route("/recording/reset", post(handlers::reset_recording))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        // The shell may be served from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
