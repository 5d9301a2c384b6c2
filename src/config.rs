use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::recording::RecorderConfig;
use crate::upload::RestUploaderConfig;

/// Environment variable prefix; `VIDEO_MESSAGE__STORAGE__API_KEY` sets `storage.api_key`
pub const ENV_PREFIX: &str = "VIDEO_MESSAGE";

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub recorder: RecorderConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "video-message".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Keep uploads in process memory
    #[default]
    Memory,
    /// Hosted storage + REST database
    Rest,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub base_url: String,
    pub bucket: String,
    pub table: String,
    /// Only ever supplied through the environment; `Config::load` rejects it in a file
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            base_url: String::new(),
            bucket: "recordings".to_string(),
            table: "recordings".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl StorageConfig {
    /// Settings for the REST uploader; fails when the URL or key is missing
    pub fn rest(&self) -> Result<RestUploaderConfig> {
        if self.base_url.trim().is_empty() {
            anyhow::bail!("storage.base_url must be set for the rest backend");
        }
        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .with_context(|| format!("{}__STORAGE__API_KEY is not set", ENV_PREFIX))?;

        Ok(RestUploaderConfig {
            base_url: self.base_url.clone(),
            bucket: self.bucket.clone(),
            table: self.table.clone(),
            api_key,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

impl Config {
    /// Load the optional config file at `path` (extension inferred), then the environment
    pub fn load(path: &str) -> Result<Self> {
        let file = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()
            .with_context(|| format!("Failed to read config file {}", path))?;
        if file.get_string("storage.api_key").is_ok() {
            anyhow::bail!(
                "storage.api_key must not be set in {}; use {}__STORAGE__API_KEY",
                path,
                ENV_PREFIX
            );
        }

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
