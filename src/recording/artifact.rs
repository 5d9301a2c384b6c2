use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::upload::extension_for;

/// A finished recording ready for upload
///
/// `data` is a shared buffer: clones are cheap and always refer to the same
/// bytes, so a retried upload sends exactly what was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingArtifact {
    /// Encoded media bytes
    pub data: Bytes,
    /// MIME type reported by the capture device
    pub content_type: String,
    /// Recorded duration in whole seconds
    pub duration_seconds: u64,
    /// When the capture was finalized
    pub recorded_at: DateTime<Utc>,
}

impl RecordingArtifact {
    pub fn new(data: Bytes, content_type: impl Into<String>, duration_seconds: u64) -> Self {
        Self {
            data,
            content_type: content_type.into(),
            duration_seconds,
            recorded_at: Utc::now(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn extension(&self) -> &'static str {
        extension_for(&self.content_type)
    }
}
