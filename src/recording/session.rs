use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One active capture, from start until the artifact is assembled
///
/// Holds the two tasks driving the capture: the duration tick and the chunk
/// collector (which owns the device's event receiver). Dropping the session
/// aborts whichever of them is still attached.
pub struct RecordingSession {
    /// Controller generation this session belongs to
    pub generation: u64,

    /// MIME type reported by the device at start
    pub content_type: String,

    /// Monotonic start instant; elapsed time is always derived from it
    pub started_at: Instant,

    /// Wall-clock start, unix millis
    pub started_at_epoch_ms: i64,

    /// Set once a stop has been requested (user or duration cap)
    pub stop_requested_at: Option<Instant>,

    pub(crate) tick: Option<JoinHandle<()>>,

    pub(crate) collector: Option<JoinHandle<()>>,
}

impl RecordingSession {
    pub fn new(generation: u64, content_type: String) -> Self {
        Self {
            generation,
            content_type,
            started_at: Instant::now(),
            started_at_epoch_ms: Utc::now().timestamp_millis(),
            stop_requested_at: None,
            tick: None,
            collector: None,
        }
    }

    /// Whole seconds between the start and `now`
    pub fn elapsed_seconds(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.started_at).as_secs()
    }

    /// Seconds recorded, measured at the stop request if there was one
    pub fn recorded_seconds(&self) -> u64 {
        self.elapsed_seconds(self.stop_requested_at.unwrap_or_else(Instant::now))
    }

    pub fn is_stopping(&self) -> bool {
        self.stop_requested_at.is_some()
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if let Some(tick) = self.tick.take() {
            tick.abort();
        }
        if let Some(collector) = self.collector.take() {
            collector.abort();
        }
    }
}
