use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{CaptureConfig, CaptureDevice, CaptureEvent};
use crate::error::CaptureError;

const DEFAULT_CHUNK_BYTES: usize = 256 * 1024;

/// Capture device that replays an existing media file
///
/// Every timeslice one slice of the file is emitted. On stop the remainder is
/// flushed so the assembled artifact is always the complete, playable file.
pub struct FileCapture {
    path: PathBuf,
    config: CaptureConfig,
    content_type: String,
    chunk_bytes: usize,
    granted: bool,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>, config: CaptureConfig) -> Self {
        let path = path.into();
        let content_type = content_type_for(&path).to_string();

        Self {
            path,
            config,
            content_type,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            granted: false,
            stop_tx: None,
            task: None,
        }
    }

    /// Override the slice size emitted per timeslice
    pub fn with_chunk_size(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }

    fn halt(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Map a file extension to the MIME type a recorder would report
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("webm") => "video/webm",
        _ => "video/mp4",
    }
}

#[async_trait::async_trait]
impl CaptureDevice for FileCapture {
    async fn request_access(&mut self) -> Result<(), CaptureError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| CaptureError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        if !metadata.is_file() {
            return Err(CaptureError::Unavailable(format!(
                "{} is not a file",
                self.path.display()
            )));
        }

        self.granted = true;
        info!("File capture ready: {}", self.path.display());
        Ok(())
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        if !self.granted {
            return Err(CaptureError::PermissionDenied);
        }
        if self.task.is_some() {
            return Err(CaptureError::Failed("capture already running".to_string()));
        }

        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CaptureError::Failed(format!("{}: {}", self.path.display(), e)))?;
        let data = Bytes::from(data);

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let timeslice = self.config.timeslice;
        let chunk_bytes = self.chunk_bytes;

        info!(
            "Starting file capture: {} ({} bytes, {} per {:?})",
            self.path.display(),
            data.len(),
            chunk_bytes,
            timeslice
        );

        let task = tokio::spawn(async move {
            let mut offset = 0;
            let mut interval = tokio::time::interval(timeslice);
            // First tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        if offset >= data.len() {
                            continue;
                        }
                        let end = (offset + chunk_bytes).min(data.len());
                        if tx.send(CaptureEvent::Data(data.slice(offset..end))).await.is_err() {
                            debug!("Capture receiver dropped");
                            return;
                        }
                        offset = end;
                    }
                }
            }

            // Flush the remainder before closing the channel
            if offset < data.len() {
                if tx.send(CaptureEvent::Data(data.slice(offset..))).await.is_err() {
                    warn!("Capture receiver dropped before final flush");
                }
            }
        });

        self.stop_tx = Some(stop_tx);
        self.task = Some(task);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| CaptureError::Failed(format!("capture task failed: {}", e)))?;
        }
        Ok(())
    }

    fn release(&mut self) {
        self.halt();
        if self.granted {
            info!("Releasing file capture: {}", self.path.display());
        }
        self.granted = false;
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileCapture {
    fn drop(&mut self) {
        self.halt();
    }
}
