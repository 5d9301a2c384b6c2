pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod recording;
pub mod upload;

pub use capture::{
    CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureEvent, CaptureSource,
    ChunkCollector, CollectedMedia, FileCapture,
};
pub use config::Config;
pub use error::{CaptureError, RecorderError, RecorderResult, UploadError};
pub use http::{create_router, AppState};
pub use recording::{
    RecorderConfig, RecorderSnapshot, RecordingArtifact, RecordingController, RecordingState,
    MAX_DURATION_SECONDS, MIN_RECORDING_SECONDS,
};
pub use upload::{
    DescriptorStatus, DeviceType, MemoryUploader, RecordingDescriptor, RestUploader, Uploader,
};
