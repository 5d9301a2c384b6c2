// Shared fakes for controller, upload and HTTP tests
//
// ScriptedCapture stands in for a camera: tests push chunks and failures through
// its handle, and can hold a permission prompt open. ScriptedUploader records every call and can be told to fail or to
// hold until released.

#![allow(dead_code)]

use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use video_message::capture::{CaptureDevice, CaptureEvent};
use video_message::upload::prepare_descriptor;
use video_message::{
    CaptureError, DeviceType, RecorderConfig, RecordingArtifact, RecordingController,
    RecordingDescriptor, RecordingState, UploadError, Uploader,
};

// ============================================================================
// Capture
// ============================================================================

#[derive(Default)]
struct CaptureScript {
    denials_remaining: usize,
    deny_always: bool,
    start_failure: Option<String>,
    tail: Option<Bytes>,
    prompt_gate: Option<Arc<Notify>>,
    sender: Option<mpsc::Sender<CaptureEvent>>,
    granted: bool,
    starts: usize,
    stops: usize,
    releases: usize,
}

pub struct ScriptedCapture {
    script: Arc<Mutex<CaptureScript>>,
}

#[derive(Clone)]
pub struct CaptureHandle {
    script: Arc<Mutex<CaptureScript>>,
}

impl ScriptedCapture {
    pub fn new() -> (Self, CaptureHandle) {
        let script = Arc::new(Mutex::new(CaptureScript::default()));
        (
            Self {
                script: Arc::clone(&script),
            },
            CaptureHandle { script },
        )
    }
}

impl CaptureHandle {
    /// Deny the next `n` permission requests
    pub fn deny_next(&self, n: usize) {
        self.script.lock().unwrap().denials_remaining = n;
    }

    pub fn deny_always(&self) {
        self.script.lock().unwrap().deny_always = true;
    }

    /// Hold the next permission prompt until the returned gate is notified
    pub fn hold_prompt(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.script.lock().unwrap().prompt_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn fail_start(&self, message: &str) {
        self.script.lock().unwrap().start_failure = Some(message.to_string());
    }

    /// Data flushed by the device while finalizing
    pub fn set_tail(&self, data: &'static [u8]) {
        self.script.lock().unwrap().tail = Some(Bytes::from_static(data));
    }

    fn sender(&self) -> mpsc::Sender<CaptureEvent> {
        self.script
            .lock()
            .unwrap()
            .sender
            .clone()
            .expect("capture not started")
    }

    pub async fn push(&self, data: &'static [u8]) {
        self.sender()
            .send(CaptureEvent::Data(Bytes::from_static(data)))
            .await
            .expect("collector gone");
    }

    pub async fn fail(&self, message: &str) {
        self.sender()
            .send(CaptureEvent::Failed(message.to_string()))
            .await
            .expect("collector gone");
    }

    pub fn starts(&self) -> usize {
        self.script.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.script.lock().unwrap().stops
    }

    pub fn releases(&self) -> usize {
        self.script.lock().unwrap().releases
    }

    pub fn is_granted(&self) -> bool {
        self.script.lock().unwrap().granted
    }
}

#[async_trait::async_trait]
impl CaptureDevice for ScriptedCapture {
    async fn request_access(&mut self) -> Result<(), CaptureError> {
        let gate = self.script.lock().unwrap().prompt_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut script = self.script.lock().unwrap();
        if script.deny_always || script.denials_remaining > 0 {
            script.denials_remaining = script.denials_remaining.saturating_sub(1);
            script.granted = false;
            return Err(CaptureError::PermissionDenied);
        }
        script.granted = true;
        Ok(())
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        let mut script = self.script.lock().unwrap();
        if let Some(message) = script.start_failure.take() {
            return Err(CaptureError::Failed(message));
        }
        if !script.granted {
            return Err(CaptureError::PermissionDenied);
        }
        let (tx, rx) = mpsc::channel(64);
        script.sender = Some(tx);
        script.starts += 1;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        let (sender, tail) = {
            let mut script = self.script.lock().unwrap();
            script.stops += 1;
            (script.sender.take(), script.tail.take())
        };
        if let (Some(sender), Some(tail)) = (&sender, tail) {
            let _ = sender.send(CaptureEvent::Data(tail)).await;
        }
        drop(sender);
        Ok(())
    }

    fn release(&mut self) {
        let mut script = self.script.lock().unwrap();
        script.sender = None;
        script.granted = false;
        script.releases += 1;
    }

    fn content_type(&self) -> &str {
        "video/webm;codecs=vp9,opus"
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Upload
// ============================================================================

#[derive(Debug, Clone)]
pub struct UploadCall {
    pub data: Bytes,
    pub content_type: String,
    pub device_type: DeviceType,
    pub duration_seconds: u64,
}

#[derive(Default)]
pub struct ScriptedUploader {
    failures: Mutex<VecDeque<UploadError>>,
    calls: Mutex<Vec<UploadCall>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedUploader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next call with `error`; queued failures are used in order
    pub fn fail_next(&self, error: UploadError) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Hold every call after its first progress report until the gate is notified
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Uploader for ScriptedUploader {
    async fn upload(
        &self,
        artifact: &RecordingArtifact,
        device_type: DeviceType,
        duration_seconds: u64,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<RecordingDescriptor, UploadError> {
        self.calls.lock().unwrap().push(UploadCall {
            data: artifact.data.clone(),
            content_type: artifact.content_type.clone(),
            device_type,
            duration_seconds,
        });
        on_progress(50);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        on_progress(100);
        Ok(RecordingDescriptor::from_new(prepare_descriptor(
            artifact,
            device_type,
            duration_seconds,
        )))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub struct Harness {
    pub controller: RecordingController,
    pub capture: CaptureHandle,
    pub uploader: Arc<ScriptedUploader>,
}

pub fn harness_with(config: RecorderConfig) -> Harness {
    let (device, capture) = ScriptedCapture::new();
    let uploader = ScriptedUploader::new();
    let controller = RecordingController::new(config, Box::new(device), uploader.clone());
    Harness {
        controller,
        capture,
        uploader,
    }
}

pub fn harness() -> Harness {
    harness_with(RecorderConfig::default())
}

/// Wait until the controller reports `state`
pub async fn wait_for_state(controller: &RecordingController, state: RecordingState) {
    let mut updates = controller.subscribe();
    tokio::time::timeout(Duration::from_secs(600), async {
        while updates.borrow_and_update().state != state {
            updates.changed().await.expect("controller dropped");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {}", state));
}
