use anyhow::Result;
use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::CaptureError;

/// Event produced by a capture device while recording
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Encoded media data (container bytes, in order)
    Data(Bytes),
    /// Recording failed mid-session; no further events follow
    Failed(String),
}

/// Configuration for capture devices
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// How often the device flushes buffered media as a chunk
    pub timeslice: Duration,
    /// Capacity of the event channel handed to the controller
    pub channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeslice: Duration::from_secs(1), // browser recorders flush every second
            channel_capacity: 64,
        }
    }
}

/// Camera + microphone capture device
///
/// Platform adapters:
/// - Web: MediaRecorder over a getUserMedia stream (hosted in the shell)
/// - Mobile: native camera view recording to a local file (hosted in the shell)
/// - File: replays an existing clip (CLI and testing)
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Ask for camera and microphone access and bind a live preview
    async fn request_access(&mut self) -> Result<(), CaptureError>;

    /// Start capturing
    ///
    /// Returns a channel receiver that yields media chunks. The channel closes
    /// once the device has finalized after [`CaptureDevice::stop`].
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError>;

    /// Ask the device to flush remaining data and close the event channel
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Stop all tracks and drop the preview, giving the hardware back
    fn release(&mut self);

    /// MIME type of the produced media
    fn content_type(&self) -> &str;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Capture source selection
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Replay a media file
    File(PathBuf),
}

/// Capture device factory
pub struct CaptureDeviceFactory;

impl CaptureDeviceFactory {
    /// Create a capture device for the given source
    pub fn create(source: CaptureSource, config: CaptureConfig) -> Result<Box<dyn CaptureDevice>> {
        match source {
            CaptureSource::File(path) => {
                let device = super::file::FileCapture::new(path, config);
                Ok(Box::new(device))
            }
        }
    }
}
