pub mod backend;
pub mod chunk;
pub mod file;

pub use backend::{CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureEvent, CaptureSource};
pub use chunk::{ChunkCollector, CollectedMedia};
pub use file::FileCapture;
