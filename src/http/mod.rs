//! HTTP control API for a presentation shell
//!
//! This module exposes the recording controller over REST:
//! - GET /recording - Current snapshot
//! - POST /recording/permission - Request camera/microphone access
//! - POST /recording/start - Start recording
//! - POST /recording/stop - Stop recording
//! - POST /recording/upload - Upload the finished recording
//! - POST /recording/retry - Retry a failed upload
//! - POST /recording/reset - Discard and return to idle
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::ErrorResponse;
pub use routes::create_router;
pub use state::AppState;
