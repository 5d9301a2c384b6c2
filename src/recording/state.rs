use serde::{Deserialize, Serialize};
use std::fmt;

use crate::upload::RecordingDescriptor;

/// Lifecycle state of the recording controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// Ready to record (permission may or may not be granted yet)
    #[default]
    Idle,
    /// Waiting on the camera/microphone permission prompt, or denied
    Requesting,
    /// Capturing
    Recording,
    /// Capture finalized; artifact available
    Stopped,
    /// Artifact handed to the upload client
    Uploading,
    /// Descriptor written
    Success,
    /// Device or upload failure; see the snapshot error
    Error,
}

impl RecordingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Requesting => "requesting",
            RecordingState::Recording => "recording",
            RecordingState::Stopped => "stopped",
            RecordingState::Uploading => "uploading",
            RecordingState::Success => "success",
            RecordingState::Error => "error",
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the presentation shell renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderSnapshot {
    pub state: RecordingState,
    pub elapsed_seconds: u64,
    pub max_duration_seconds: u64,
    pub has_permission: bool,
    pub error: Option<String>,
    /// Advisory upload progress, 0..=100
    pub upload_progress: u8,
    pub has_artifact: bool,
    pub descriptor: Option<RecordingDescriptor>,
}

impl RecorderSnapshot {
    pub fn new(max_duration_seconds: u64) -> Self {
        Self {
            state: RecordingState::Idle,
            elapsed_seconds: 0,
            max_duration_seconds,
            has_permission: false,
            error: None,
            upload_progress: 0,
            has_artifact: false,
            descriptor: None,
        }
    }
}
