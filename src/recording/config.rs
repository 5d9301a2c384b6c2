use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::upload::DeviceType;

/// Hard ceiling on a recording, in seconds
pub const MAX_DURATION_SECONDS: u64 = 120;

/// Shortest recording accepted when minimum-duration validation is enabled
pub const MIN_RECORDING_SECONDS: u64 = 3;

/// Duration counter refresh interval
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Configuration for the recording controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Recording is stopped automatically once this many seconds have elapsed
    pub max_duration_secs: u64,

    /// How often the elapsed counter is recomputed from the wall clock
    pub tick_interval_ms: u64,

    /// Minimum accepted duration for uploads
    pub min_duration_secs: u64,

    /// Reject uploads shorter than `min_duration_secs`
    /// Default: false (the minimum is advisory)
    pub enforce_min_duration: bool,

    /// Recorded into every descriptor and used for the storage path
    pub device_type: DeviceType,
}

impl RecorderConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: MAX_DURATION_SECONDS,
            tick_interval_ms: TICK_INTERVAL.as_millis() as u64,
            min_duration_secs: MIN_RECORDING_SECONDS,
            enforce_min_duration: false,
            device_type: DeviceType::Web,
        }
    }
}
