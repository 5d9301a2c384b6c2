use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::client::{prepare_descriptor, Uploader};
use super::descriptor::{DeviceType, RecordingDescriptor};
use crate::error::UploadError;
use crate::recording::RecordingArtifact;

/// In-process object store and descriptor table
#[derive(Clone, Default)]
pub struct MemoryUploader {
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
    descriptors: Arc<RwLock<Vec<RecordingDescriptor>>>,
}

impl MemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored bytes for a storage path
    pub async fn object(&self, storage_path: &str) -> Option<Bytes> {
        self.objects.read().await.get(storage_path).cloned()
    }

    /// All descriptor rows in insertion order
    pub async fn descriptors(&self) -> Vec<RecordingDescriptor> {
        self.descriptors.read().await.clone()
    }
}

#[async_trait::async_trait]
impl Uploader for MemoryUploader {
    async fn upload(
        &self,
        artifact: &RecordingArtifact,
        device_type: DeviceType,
        duration_seconds: u64,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<RecordingDescriptor, UploadError> {
        let new = prepare_descriptor(artifact, device_type, duration_seconds);

        {
            let mut objects = self.objects.write().await;
            if objects.contains_key(&new.storage_path) {
                return Err(UploadError::Storage(format!(
                    "The resource already exists: {}",
                    new.storage_path
                )));
            }
            objects.insert(new.storage_path.clone(), artifact.data.clone());
        }
        on_progress(80);

        let descriptor = RecordingDescriptor::from_new(new);
        self.descriptors.write().await.push(descriptor.clone());
        on_progress(100);

        info!(
            "Stored {} ({} bytes) as {}",
            descriptor.storage_path, descriptor.file_size_bytes, descriptor.id
        );

        Ok(descriptor)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
