//! Recording lifecycle
//!
//! This module provides the [`RecordingController`] state machine that manages:
//! - The camera/microphone permission gate
//! - Capture start/stop with a wall-clock duration cap
//! - Assembly of the finished artifact
//! - Upload hand-off, failure capture and retry
//! - Snapshots for the presentation shell

mod artifact;
mod config;
mod controller;
mod session;
mod state;

pub use artifact::RecordingArtifact;
pub use config::{RecorderConfig, MAX_DURATION_SECONDS, MIN_RECORDING_SECONDS, TICK_INTERVAL};
pub use controller::RecordingController;
pub use session::RecordingSession;
pub use state::{RecorderSnapshot, RecordingState};
