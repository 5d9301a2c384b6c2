use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which client recorded the clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Web,
    Mobile,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Web => "web",
            DeviceType::Mobile => "mobile",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "web" => Ok(DeviceType::Web),
            "mobile" => Ok(DeviceType::Mobile),
            other => Err(format!("unknown device type: {}", other)),
        }
    }
}

/// Lifecycle status of a stored recording
///
/// Uploads always write `uploaded`; the other values are set by the hosting
/// service and only show up in rows read back from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorStatus {
    #[default]
    Uploaded,
    Processing,
    Ready,
    Deleted,
}

/// Insert payload for the descriptor table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDescriptor {
    pub duration_seconds: u64,
    pub file_size_bytes: u64,
    pub device_type: DeviceType,
    pub storage_path: String,
    pub status: DescriptorStatus,
    pub metadata: serde_json::Value,
}

/// Persisted metadata row describing a stored recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingDescriptor {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub file_size_bytes: u64,
    pub device_type: DeviceType,
    pub storage_path: String,
    #[serde(default)]
    pub status: DescriptorStatus,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl RecordingDescriptor {
    /// Materialize a row from an insert payload, as the table would
    pub fn from_new(new: NewDescriptor) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            duration_seconds: new.duration_seconds,
            file_size_bytes: new.file_size_bytes,
            device_type: new.device_type,
            storage_path: new.storage_path,
            status: new.status,
            metadata: new.metadata,
        }
    }
}
