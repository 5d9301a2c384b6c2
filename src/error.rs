//! Error taxonomy for capture, upload and controller failures

use thiserror::Error;

use crate::recording::RecordingState;

/// Failures reported by a capture device adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// User or OS refused camera/microphone access
    #[error("Camera & microphone access is required. Please allow permissions and try again.")]
    PermissionDenied,

    /// Device could not be opened (missing hardware, busy, unreadable source)
    #[error("Could not access camera: {0}")]
    Unavailable(String),

    /// Runtime failure while capturing
    #[error("{0}")]
    Failed(String),
}

/// Failures reported by an upload client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Object storage rejected the bytes
    #[error("Upload failed: {0}")]
    Storage(String),

    /// Descriptor row could not be written
    #[error("Metadata save failed: {0}")]
    Metadata(String),

    /// Network or transport failure, message passed through verbatim
    #[error("{0}")]
    Transport(String),
}

/// Errors returned by [`crate::recording::RecordingController`] operations.
///
/// The same message is also attached to the controller snapshot, so callers that
/// only render snapshots never need to inspect these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Device(String),

    #[error("{0}")]
    Upload(String),

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: RecordingState,
    },

    /// A permission prompt or capture start is still waiting on the device
    #[error("cannot {action} while a {pending} is in progress")]
    Busy {
        action: &'static str,
        pending: &'static str,
    },

    #[error("no recording to upload")]
    NoArtifact,

    #[error("Recording is too short ({actual}s). Please record at least {minimum} seconds.")]
    TooShort { actual: u64, minimum: u64 },

    /// The session was reset while the operation was in flight
    #[error("recording was discarded")]
    Discarded,
}

impl From<UploadError> for RecorderError {
    fn from(error: UploadError) -> Self {
        RecorderError::Upload(error.to_string())
    }
}

pub type RecorderResult<T> = Result<T, RecorderError>;
