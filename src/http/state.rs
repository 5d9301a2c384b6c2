use crate::recording::RecordingController;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The recorder driven by this API
    pub controller: RecordingController,
}

impl AppState {
    pub fn new(controller: RecordingController) -> Self {
        Self { controller }
    }
}
