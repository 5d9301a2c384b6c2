use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::CaptureEvent;

/// Media assembled from the chunks of one capture session
#[derive(Debug, Clone)]
pub struct CollectedMedia {
    /// All chunk bytes concatenated in arrival order
    pub data: Bytes,
    /// Number of non-empty chunks received
    pub chunk_count: usize,
}

/// Buffers capture chunks until the device closes its channel
#[derive(Debug, Default)]
pub struct ChunkCollector {
    chunks: Vec<Bytes>,
    total_bytes: usize,
}

impl ChunkCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the event channel
    ///
    /// Returns the assembled media once the channel closes, or the failure
    /// message if the device reports an error first.
    pub async fn collect(
        mut self,
        mut events: mpsc::Receiver<CaptureEvent>,
    ) -> Result<CollectedMedia, String> {
        while let Some(event) = events.recv().await {
            match event {
                CaptureEvent::Data(chunk) => self.push(chunk),
                CaptureEvent::Failed(message) => {
                    warn!(
                        "Capture failed after {} chunks: {}",
                        self.chunks.len(),
                        message
                    );
                    return Err(message);
                }
            }
        }

        Ok(self.finish())
    }

    fn push(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.total_bytes += chunk.len();
        debug!(
            "Chunk {} received ({} bytes, {} total)",
            self.chunks.len(),
            chunk.len(),
            self.total_bytes
        );
        self.chunks.push(chunk);
    }

    fn finish(self) -> CollectedMedia {
        let chunk_count = self.chunks.len();
        let data = match chunk_count {
            0 => Bytes::new(),
            1 => self.chunks.into_iter().next().unwrap_or_default(),
            _ => {
                let mut buffer = BytesMut::with_capacity(self.total_bytes);
                for chunk in &self.chunks {
                    buffer.extend_from_slice(chunk);
                }
                buffer.freeze()
            }
        };

        info!(
            "Capture finalized: {} chunks, {} bytes",
            chunk_count,
            data.len()
        );

        CollectedMedia { data, chunk_count }
    }
}
