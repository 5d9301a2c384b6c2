use anyhow::{Context, Result};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

use super::client::{prepare_descriptor, Uploader};
use super::descriptor::{DeviceType, RecordingDescriptor};
use crate::error::UploadError;
use crate::recording::RecordingArtifact;

/// Connection settings for the hosted storage + database service
#[derive(Debug, Clone)]
pub struct RestUploaderConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub base_url: String,
    /// Storage bucket holding the media objects
    pub bucket: String,
    /// Table receiving descriptor rows
    pub table: String,
    /// Service API key (sent as bearer token and `apikey` header)
    pub api_key: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

/// Uploader for a Supabase-compatible storage and REST API
pub struct RestUploader {
    client: Client,
    config: RestUploaderConfig,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl RestUploader {
    pub fn new(config: RestUploaderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        info!(
            "REST uploader configured: {} (bucket={}, table={})",
            config.base_url, config.bucket, config.table
        );

        Ok(Self { client, config })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn object_url(&self, storage_path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base(),
            self.config.bucket,
            storage_path
        )
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base(), self.config.table)
    }
}

fn transport_error(e: reqwest::Error) -> UploadError {
    if e.is_timeout() {
        UploadError::Transport("Network timeout".to_string())
    } else {
        UploadError::Transport(e.to_string())
    }
}

/// Best-effort human-readable message from a failed response
async fn failure_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ServiceError>(&body) {
        Ok(ServiceError {
            message: Some(message),
            ..
        }) => message,
        Ok(ServiceError {
            error: Some(error), ..
        }) => error,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status.to_string(),
    }
}

#[async_trait::async_trait]
impl Uploader for RestUploader {
    async fn upload(
        &self,
        artifact: &RecordingArtifact,
        device_type: DeviceType,
        duration_seconds: u64,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<RecordingDescriptor, UploadError> {
        let new = prepare_descriptor(artifact, device_type, duration_seconds);
        on_progress(10);

        let response = self
            .client
            .post(self.object_url(&new.storage_path))
            .bearer_auth(&self.config.api_key)
            .header("apikey", &self.config.api_key)
            .header(CONTENT_TYPE, artifact.content_type.as_str())
            .header(CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(artifact.data.clone())
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            error!("Storage upload failed for {}: {}", new.storage_path, message);
            return Err(UploadError::Storage(message));
        }
        on_progress(70);

        let response = self
            .client
            .post(self.table_url())
            .bearer_auth(&self.config.api_key)
            .header("apikey", &self.config.api_key)
            .header("Prefer", "return=representation")
            .json(&new)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            error!("Descriptor insert failed for {}: {}", new.storage_path, message);
            return Err(UploadError::Metadata(message));
        }

        let rows: Vec<RecordingDescriptor> = response
            .json()
            .await
            .map_err(|e| UploadError::Metadata(e.to_string()))?;
        let descriptor = rows
            .into_iter()
            .next()
            .ok_or_else(|| UploadError::Metadata("no row returned".to_string()))?;

        on_progress(100);
        info!(
            "Uploaded {} ({} bytes) as {}",
            descriptor.storage_path, descriptor.file_size_bytes, descriptor.id
        );

        Ok(descriptor)
    }

    fn name(&self) -> &str {
        "rest"
    }
}
