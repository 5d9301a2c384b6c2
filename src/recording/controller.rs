use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::artifact::RecordingArtifact;
use super::config::RecorderConfig;
use super::session::RecordingSession;
use super::state::{RecorderSnapshot, RecordingState};
use crate::capture::{CaptureDevice, ChunkCollector, CollectedMedia};
use crate::error::{RecorderError, RecorderResult};
use crate::upload::{RecordingDescriptor, Uploader};

/// Platform-agnostic recording state machine
///
/// Drives permission → record → stop → upload over a [`CaptureDevice`] and an
/// [`Uploader`]. Cloning is cheap; all clones drive the same controller.
///
/// Every failure is caught here and attached to the snapshot as a message. The
/// same failure is also returned to the caller of the operation.
#[derive(Clone)]
pub struct RecordingController {
    shared: Arc<Shared>,
}

struct Shared {
    config: RecorderConfig,
    /// Locked before `inner` when both are held; `inner` is never held while
    /// waiting on this lock
    device: Mutex<DeviceSlot>,
    uploader: Arc<dyn Uploader>,
    inner: Mutex<Inner>,
    /// Bumped on permission request, start, upload and reset; stale completions
    /// compare against it
    generation: AtomicU64,
    upload_progress: AtomicU8,
    snapshot_tx: watch::Sender<RecorderSnapshot>,
}

/// The capture device and the generation of the last call that claimed it
struct DeviceSlot {
    device: Box<dyn CaptureDevice>,
    claimed_by: u64,
}

impl DeviceSlot {
    fn claim(&mut self, generation: u64) -> &mut Box<dyn CaptureDevice> {
        self.claimed_by = generation;
        &mut self.device
    }

    /// Release unless a call newer than `generation` has claimed the device
    fn release_for(&mut self, generation: u64) {
        if self.claimed_by <= generation {
            self.device.release();
        } else {
            debug!("Capture device claimed after reset; keeping it");
        }
    }
}

/// Device call in flight outside the state lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceCall {
    Permission,
    Start,
}

impl DeviceCall {
    fn as_str(&self) -> &'static str {
        match self {
            DeviceCall::Permission => "permission request",
            DeviceCall::Start => "capture start",
        }
    }
}

#[derive(Default)]
struct Inner {
    state: RecordingState,
    device_call: Option<DeviceCall>,
    elapsed_seconds: u64,
    has_permission: bool,
    error: Option<String>,
    artifact: Option<RecordingArtifact>,
    descriptor: Option<RecordingDescriptor>,
    session: Option<RecordingSession>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopTrigger {
    User,
    MaxDuration,
}

impl Shared {
    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish(&self, inner: &Inner) {
        let snapshot = RecorderSnapshot {
            state: inner.state,
            elapsed_seconds: inner.elapsed_seconds,
            max_duration_seconds: self.config.max_duration_secs,
            has_permission: inner.has_permission,
            error: inner.error.clone(),
            upload_progress: self.upload_progress.load(Ordering::SeqCst),
            has_artifact: inner.artifact.is_some(),
            descriptor: inner.descriptor.clone(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }

    fn report_progress(&self, generation: u64, pct: u8) {
        if self.current_generation() != generation {
            return;
        }
        let pct = pct.min(100);
        self.upload_progress.store(pct, Ordering::SeqCst);
        self.snapshot_tx.send_modify(|snapshot| snapshot.upload_progress = pct);
        debug!("Upload progress: {}%", pct);
    }
}

impl RecordingController {
    pub fn new(
        config: RecorderConfig,
        device: Box<dyn CaptureDevice>,
        uploader: Arc<dyn Uploader>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(RecorderSnapshot::new(config.max_duration_secs));

        info!(
            "Recording controller ready: device={}, uploader={}, max={}s",
            device.name(),
            uploader.name(),
            config.max_duration_secs
        );

        Self {
            shared: Arc::new(Shared {
                config,
                device: Mutex::new(DeviceSlot {
                    device,
                    claimed_by: 0,
                }),
                uploader,
                inner: Mutex::new(Inner::default()),
                generation: AtomicU64::new(0),
                upload_progress: AtomicU8::new(0),
                snapshot_tx,
            }),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.shared.config
    }

    /// Current state as the presentation shell sees it
    pub fn snapshot(&self) -> RecorderSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Receiver notified on every state, tick or progress change
    pub fn subscribe(&self) -> watch::Receiver<RecorderSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    pub fn state(&self) -> RecordingState {
        self.shared.snapshot_tx.borrow().state
    }

    /// The retained artifact, if any
    pub async fn artifact(&self) -> Option<RecordingArtifact> {
        self.lock().await.artifact.clone()
    }

    async fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().await
    }

    /// Ask for camera and microphone access
    ///
    /// On denial the gate stays unsatisfied (state `requesting`) and the reason is
    /// attached to the snapshot. The caller may simply try again.
    pub async fn request_permission(&self) -> RecorderResult<()> {
        let (generation, previously_granted) = {
            let mut inner = self.lock().await;
            match inner.state {
                RecordingState::Idle | RecordingState::Requesting => {}
                state => {
                    return Err(RecorderError::InvalidTransition {
                        action: "request permission",
                        state,
                    })
                }
            }
            Self::check_device_free(&inner, "request permission")?;

            let previously_granted = inner.has_permission;
            inner.state = RecordingState::Requesting;
            inner.device_call = Some(DeviceCall::Permission);
            inner.has_permission = false;
            inner.error = None;
            self.shared.publish(&inner);
            (self.shared.next_generation(), previously_granted)
        };

        info!("Requesting camera and microphone access");

        let mut slot = self.shared.device.lock().await;
        let device = slot.claim(generation);
        if previously_granted {
            device.release();
        }
        let result = device.request_access().await;

        // The slot stays locked until the outcome is recorded
        let mut inner = self.lock().await;
        if self.shared.current_generation() != generation {
            if result.is_ok() {
                slot.device.release();
            }
            debug!("Permission answered after reset; result discarded");
            return Err(RecorderError::Discarded);
        }
        inner.device_call = None;

        match result {
            Ok(()) => {
                inner.has_permission = true;
                inner.error = None;
                inner.state = RecordingState::Idle;
                self.shared.publish(&inner);
                info!("Camera and microphone access granted");
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                inner.error = Some(message.clone());
                self.shared.publish(&inner);
                warn!("Capture permission not granted: {}", message);
                Err(RecorderError::PermissionDenied(message))
            }
        }
    }

    /// Start a new recording
    ///
    /// Requests permission first when it has not been granted. Starting from
    /// `stopped` discards the previous artifact.
    pub async fn start_recording(&self) -> RecorderResult<()> {
        let needs_permission = {
            let inner = self.lock().await;
            Self::check_can_start(inner.state)?;
            Self::check_device_free(&inner, "start recording")?;
            !inner.has_permission
        };

        if needs_permission {
            self.request_permission().await?;
        }

        let generation = {
            let mut inner = self.lock().await;
            Self::check_can_start(inner.state)?;
            Self::check_device_free(&inner, "start recording")?;
            if !inner.has_permission {
                return Err(RecorderError::PermissionDenied(
                    "camera and microphone access has not been granted".to_string(),
                ));
            }
            inner.device_call = Some(DeviceCall::Start);
            self.shared.next_generation()
        };

        let mut slot = self.shared.device.lock().await;
        let device = slot.claim(generation);
        let content_type = device.content_type().to_string();
        info!("Starting recording on {} ({})", device.name(), content_type);
        let started = device.start().await;

        let mut inner = self.lock().await;
        if self.shared.current_generation() != generation {
            // Reset while starting; the receiver is dropped with `started`
            if started.is_ok() {
                slot.device.release();
            }
            debug!("Capture started after reset; discarded");
            return Err(RecorderError::Discarded);
        }
        drop(slot);
        inner.device_call = None;

        let events = match started {
            Ok(events) => events,
            Err(e) => {
                let message = format!("Recording error: {}", e);
                error!("{}", message);
                inner.state = RecordingState::Error;
                inner.error = Some(message.clone());
                self.shared.publish(&inner);
                return Err(RecorderError::Device(message));
            }
        };

        let mut session = RecordingSession::new(generation, content_type);

        let controller = self.clone();
        session.collector = Some(tokio::spawn(async move {
            let outcome = ChunkCollector::new().collect(events).await;
            controller.finish_capture(generation, outcome).await;
        }));

        let controller = self.clone();
        let interval = self.shared.config.tick_interval();
        session.tick = Some(tokio::spawn(async move {
            controller.run_tick(generation, interval).await;
        }));

        inner.session = Some(session);
        inner.state = RecordingState::Recording;
        inner.elapsed_seconds = 0;
        inner.error = None;
        inner.artifact = None;
        inner.descriptor = None;
        self.shared.upload_progress.store(0, Ordering::SeqCst);
        self.shared.publish(&inner);

        Ok(())
    }

    fn check_can_start(state: RecordingState) -> RecorderResult<()> {
        match state {
            RecordingState::Idle | RecordingState::Requesting | RecordingState::Stopped => Ok(()),
            state => Err(RecorderError::InvalidTransition {
                action: "start recording",
                state,
            }),
        }
    }

    fn check_device_free(inner: &Inner, action: &'static str) -> RecorderResult<()> {
        match inner.device_call {
            Some(call) => Err(RecorderError::Busy {
                action,
                pending: call.as_str(),
            }),
            None => Ok(()),
        }
    }

    /// Stop the current recording and assemble the artifact
    ///
    /// Does nothing when no recording is running.
    pub async fn stop_recording(&self) -> RecorderResult<()> {
        let generation = {
            let inner = self.lock().await;
            match (&inner.state, &inner.session) {
                (RecordingState::Recording, Some(session)) => session.generation,
                _ => {
                    debug!("Stop requested while {}; ignoring", inner.state);
                    return Ok(());
                }
            }
        };

        self.finalize(generation, StopTrigger::User).await
    }

    /// Periodic duration tick; recomputes elapsed time from the start instant
    async fn run_tick(&self, generation: u64, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let cap_reached = {
                let mut inner = self.lock().await;
                if inner.state != RecordingState::Recording {
                    return;
                }
                let elapsed = match inner.session.as_ref() {
                    Some(session) if session.generation == generation => {
                        session.elapsed_seconds(Instant::now())
                    }
                    _ => return,
                };
                if elapsed != inner.elapsed_seconds {
                    inner.elapsed_seconds = elapsed;
                    self.shared.publish(&inner);
                }
                elapsed >= self.shared.config.max_duration_secs
            };

            if cap_reached {
                info!(
                    "Maximum duration of {}s reached, stopping",
                    self.shared.config.max_duration_secs
                );
                if let Err(e) = self.finalize(generation, StopTrigger::MaxDuration).await {
                    warn!("Automatic stop failed: {}", e);
                }
                return;
            }
        }
    }

    /// Cancel the tick, finalize the device, wait for the artifact
    async fn finalize(&self, generation: u64, trigger: StopTrigger) -> RecorderResult<()> {
        let collector = {
            let mut inner = self.lock().await;
            if inner.state != RecordingState::Recording {
                return Ok(());
            }
            let session = match inner.session.as_mut() {
                Some(session) if session.generation == generation => session,
                _ => return Ok(()),
            };
            if session.is_stopping() {
                debug!("Stop already in progress");
                return Ok(());
            }
            session.stop_requested_at = Some(Instant::now());

            // The tick must be gone before the device finalizes
            if let Some(tick) = session.tick.take() {
                match trigger {
                    StopTrigger::User => tick.abort(),
                    // Running inside the tick task itself; detach
                    StopTrigger::MaxDuration => drop(tick),
                }
            }
            info!(
                "Stopping recording after {}s ({:?})",
                session.recorded_seconds(),
                trigger
            );
            session.collector.take()
        };

        let stopped = {
            let mut slot = self.shared.device.lock().await;
            slot.device.stop().await
        };

        if let Err(e) = stopped {
            if let Some(collector) = collector {
                collector.abort();
            }
            let message = format!("Recording failed: {}", e);
            self.fail_capture(generation, message.clone()).await;
            return Err(RecorderError::Device(message));
        }

        if let Some(collector) = collector {
            if let Err(e) = collector.await {
                let message = format!("Recording failed: {}", e);
                self.fail_capture(generation, message.clone()).await;
                return Err(RecorderError::Device(message));
            }
        }

        let inner = self.lock().await;
        if self.shared.current_generation() != generation {
            return Err(RecorderError::Discarded);
        }
        match inner.state {
            RecordingState::Error => Err(RecorderError::Device(
                inner.error.clone().unwrap_or_default(),
            )),
            _ => Ok(()),
        }
    }

    /// Collector completion: assemble the artifact or record the device failure
    async fn finish_capture(&self, generation: u64, outcome: Result<CollectedMedia, String>) {
        let mut inner = self.lock().await;
        if self.shared.current_generation() != generation
            || inner.state != RecordingState::Recording
        {
            debug!("Discarding capture result of a stale session");
            return;
        }

        let Some(mut session) = inner.session.take() else {
            return;
        };
        // This runs inside the collector task
        drop(session.collector.take());

        let duration = session
            .recorded_seconds()
            .min(self.shared.config.max_duration_secs);

        match outcome {
            Ok(media) => {
                let artifact =
                    RecordingArtifact::new(media.data, session.content_type.clone(), duration);
                info!(
                    "Recording stopped: {}s from {} ms, {} bytes in {} chunks",
                    duration,
                    session.started_at_epoch_ms,
                    artifact.size_bytes(),
                    media.chunk_count
                );
                inner.elapsed_seconds = duration;
                inner.artifact = Some(artifact);
                inner.state = RecordingState::Stopped;
            }
            Err(message) => {
                let message = format!("Recording failed: {}", message);
                error!("{}", message);
                inner.elapsed_seconds = duration;
                inner.artifact = None;
                inner.error = Some(message);
                inner.state = RecordingState::Error;
            }
        }

        drop(session);
        self.shared.publish(&inner);
    }

    async fn fail_capture(&self, generation: u64, message: String) {
        let mut inner = self.lock().await;
        if self.shared.current_generation() != generation
            || inner.state != RecordingState::Recording
        {
            return;
        }
        error!("{}", message);
        inner.session = None;
        inner.artifact = None;
        inner.error = Some(message);
        inner.state = RecordingState::Error;
        self.shared.publish(&inner);
    }

    /// Upload the retained artifact
    ///
    /// Allowed from `stopped`, and from `error` while the artifact is still
    /// retained. A failed upload keeps the artifact so it can be retried as-is.
    pub async fn upload(&self) -> RecorderResult<RecordingDescriptor> {
        let (artifact, generation) = {
            let mut inner = self.lock().await;
            match inner.state {
                RecordingState::Stopped => {}
                RecordingState::Error if inner.artifact.is_some() => {}
                state => {
                    return Err(RecorderError::InvalidTransition {
                        action: "upload",
                        state,
                    })
                }
            }
            Self::check_device_free(&inner, "upload")?;
            let artifact = inner.artifact.clone().ok_or(RecorderError::NoArtifact)?;

            let config = &self.shared.config;
            if config.enforce_min_duration && artifact.duration_seconds < config.min_duration_secs {
                let err = RecorderError::TooShort {
                    actual: artifact.duration_seconds,
                    minimum: config.min_duration_secs,
                };
                warn!("{}", err);
                inner.error = Some(err.to_string());
                self.shared.publish(&inner);
                return Err(err);
            }

            let generation = self.shared.next_generation();
            inner.state = RecordingState::Uploading;
            inner.error = None;
            self.shared.upload_progress.store(0, Ordering::SeqCst);
            self.shared.publish(&inner);
            (artifact, generation)
        };

        let device_type = self.shared.config.device_type;
        info!(
            "Uploading {}s {} recording ({} bytes) via {}",
            artifact.duration_seconds,
            device_type,
            artifact.size_bytes(),
            self.shared.uploader.name()
        );

        let shared = Arc::clone(&self.shared);
        let on_progress = move |pct: u8| shared.report_progress(generation, pct);
        let result = self
            .shared
            .uploader
            .upload(&artifact, device_type, artifact.duration_seconds, &on_progress)
            .await;

        let mut inner = self.lock().await;
        if self.shared.current_generation() != generation {
            debug!("Upload finished after reset; result discarded");
            return Err(RecorderError::Discarded);
        }

        match result {
            Ok(descriptor) => {
                info!("Upload complete: {}", descriptor.storage_path);
                inner.state = RecordingState::Success;
                inner.descriptor = Some(descriptor.clone());
                self.shared.upload_progress.store(100, Ordering::SeqCst);
                self.shared.publish(&inner);
                Ok(descriptor)
            }
            Err(e) => {
                error!("Upload failed: {}", e);
                inner.state = RecordingState::Error;
                inner.error = Some(e.to_string());
                self.shared.publish(&inner);
                Err(e.into())
            }
        }
    }

    /// Re-attempt a failed upload with the same artifact
    pub async fn retry(&self) -> RecorderResult<RecordingDescriptor> {
        {
            let inner = self.lock().await;
            if inner.state != RecordingState::Error {
                return Err(RecorderError::InvalidTransition {
                    action: "retry",
                    state: inner.state,
                });
            }
            if inner.artifact.is_none() {
                return Err(RecorderError::NoArtifact);
            }
        }

        info!("Retrying upload");
        self.upload().await
    }

    /// Discard everything and return to `idle`, releasing the capture device
    ///
    /// Never waits on a pending permission prompt: when the device is busy the
    /// release happens as soon as the prompt lets go of it.
    pub async fn reset(&self) {
        let (session, generation) = {
            let mut inner = self.lock().await;
            let generation = self.shared.next_generation();
            let session = inner.session.take();
            *inner = Inner::default();
            self.shared.upload_progress.store(0, Ordering::SeqCst);
            self.shared.publish(&inner);
            (session, generation)
        };

        // Aborts the tick and collector, if a recording was running
        drop(session);

        match self.shared.device.try_lock() {
            Ok(mut slot) => slot.release_for(generation),
            Err(_) => {
                debug!("Capture device busy; release deferred");
                let shared = Arc::clone(&self.shared);
                tokio::spawn(async move {
                    shared.device.lock().await.release_for(generation);
                });
            }
        }
        info!("Recorder reset");
    }

    /// Teardown: like reset, for when the hosting view goes away
    pub async fn shutdown(&self) {
        self.reset().await;
        info!("Recorder shut down");
    }
}
