use chrono::Utc;
use serde_json::json;

use super::descriptor::{DescriptorStatus, DeviceType, NewDescriptor, RecordingDescriptor};
use super::path::storage_path;
use crate::error::UploadError;
use crate::recording::RecordingArtifact;

/// Upload client consumed by the recording controller
///
/// From the controller's point of view an upload is atomic: either a descriptor
/// comes back or an error does. Progress reports are advisory and may be coarse;
/// only a final 100 on success is expected.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Store the artifact bytes and write its descriptor row
    async fn upload(
        &self,
        artifact: &RecordingArtifact,
        device_type: DeviceType,
        duration_seconds: u64,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<RecordingDescriptor, UploadError>;

    /// Uploader name for logging
    fn name(&self) -> &str;
}

/// Object path and insert payload for an artifact
///
/// The path is derived from the current wall-clock millis, so two uploads of the
/// same artifact (a retry) land at distinct paths.
pub fn prepare_descriptor(
    artifact: &RecordingArtifact,
    device_type: DeviceType,
    duration_seconds: u64,
) -> NewDescriptor {
    let path = storage_path(
        device_type,
        Utc::now().timestamp_millis(),
        &artifact.content_type,
    );

    let mut metadata = json!({
        "content_type": artifact.content_type,
        "recorded_at": artifact.recorded_at.to_rfc3339(),
    });
    match device_type {
        DeviceType::Web => {
            metadata["user_agent"] = json!(concat!("video-message/", env!("CARGO_PKG_VERSION")));
        }
        DeviceType::Mobile => {
            metadata["platform"] = json!(std::env::consts::OS);
        }
    }

    NewDescriptor {
        duration_seconds,
        file_size_bytes: artifact.size_bytes(),
        device_type,
        storage_path: path,
        status: DescriptorStatus::Uploaded,
        metadata,
    }
}
