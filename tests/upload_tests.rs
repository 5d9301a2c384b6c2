// Tests for descriptor shapes and the in-memory uploader

use anyhow::Result;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use video_message::upload::{prepare_descriptor, NewDescriptor};
use video_message::{
    DescriptorStatus, DeviceType, MemoryUploader, RecordingArtifact, RecordingDescriptor, Uploader,
};

fn artifact(data: &'static [u8], content_type: &str, seconds: u64) -> RecordingArtifact {
    RecordingArtifact::new(Bytes::from_static(data), content_type, seconds)
}

#[tokio::test]
async fn test_memory_upload_stores_bytes_and_descriptor() -> Result<()> {
    let uploader = MemoryUploader::new();
    let clip = artifact(b"webm-bytes", "video/webm;codecs=vp8,opus", 12);

    let progress = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&progress);
    let on_progress = move |pct: u8| seen.lock().unwrap().push(pct);

    let descriptor = uploader
        .upload(&clip, DeviceType::Web, clip.duration_seconds, &on_progress)
        .await?;

    assert_eq!(descriptor.duration_seconds, 12);
    assert_eq!(descriptor.file_size_bytes, 10);
    assert_eq!(descriptor.device_type, DeviceType::Web);
    assert_eq!(descriptor.status, DescriptorStatus::Uploaded);
    assert!(descriptor.storage_path.starts_with("web/web_"));
    assert!(descriptor.storage_path.ends_with(".webm"));
    assert_eq!(
        descriptor.metadata["content_type"],
        "video/webm;codecs=vp8,opus"
    );
    assert!(descriptor.metadata["user_agent"].is_string());

    let stored = uploader.object(&descriptor.storage_path).await;
    assert_eq!(stored, Some(Bytes::from_static(b"webm-bytes")));
    assert_eq!(uploader.descriptors().await, vec![descriptor]);
    assert_eq!(progress.lock().unwrap().last(), Some(&100));

    Ok(())
}

#[tokio::test]
async fn test_memory_upload_mobile_uses_mp4_path() -> Result<()> {
    let uploader = MemoryUploader::new();
    let clip = artifact(b"mp4", "video/mp4", 30);

    let descriptor = uploader
        .upload(&clip, DeviceType::Mobile, 30, &|_: u8| {})
        .await?;

    assert!(descriptor.storage_path.starts_with("mobile/mobile_"));
    assert!(descriptor.storage_path.ends_with(".mp4"));
    assert!(descriptor.metadata["platform"].is_string());
    assert!(descriptor.metadata.get("user_agent").is_none());

    Ok(())
}

#[test]
fn test_prepare_descriptor_fields() {
    let clip = artifact(b"12345", "video/webm", 7);
    let new = prepare_descriptor(&clip, DeviceType::Web, 7);

    assert_eq!(new.duration_seconds, 7);
    assert_eq!(new.file_size_bytes, 5);
    assert_eq!(new.status, DescriptorStatus::Uploaded);
    assert_eq!(
        new.metadata["recorded_at"],
        clip.recorded_at.to_rfc3339().as_str()
    );
}

#[test]
fn test_new_descriptor_wire_shape() {
    let new = NewDescriptor {
        duration_seconds: 5,
        file_size_bytes: 1024,
        device_type: DeviceType::Mobile,
        storage_path: "mobile/mobile_1700000000000.mp4".to_string(),
        status: DescriptorStatus::Uploaded,
        metadata: serde_json::json!({ "content_type": "video/mp4" }),
    };

    let json = serde_json::to_value(&new).unwrap();
    assert_eq!(json["duration_seconds"], 5);
    assert_eq!(json["file_size_bytes"], 1024);
    assert_eq!(json["device_type"], "mobile");
    assert_eq!(json["status"], "uploaded");
    assert_eq!(json["storage_path"], "mobile/mobile_1700000000000.mp4");
    assert_eq!(json["metadata"]["content_type"], "video/mp4");
}

#[test]
fn test_descriptor_row_deserialization() {
    let json = r#"{
        "id": "0b6d3f4e-8a57-4c1e-9d7a-2f1b5e3c9a10",
        "created_at": "2026-01-26T10:15:00+00:00",
        "duration_seconds": 42,
        "file_size_bytes": 2048000,
        "device_type": "web",
        "storage_path": "web/web_1769422500000.webm",
        "thumbnail_path": null,
        "status": "deleted",
        "metadata": {"content_type": "video/webm"}
    }"#;

    let row: RecordingDescriptor = serde_json::from_str(json).unwrap();
    assert_eq!(row.duration_seconds, 42);
    assert_eq!(row.device_type, DeviceType::Web);
    assert_eq!(row.status, DescriptorStatus::Deleted);
}

#[test]
fn test_descriptor_row_defaults_missing_status() {
    let json = r#"{
        "id": "0b6d3f4e-8a57-4c1e-9d7a-2f1b5e3c9a10",
        "created_at": "2026-01-26T10:15:00Z",
        "duration_seconds": 1,
        "file_size_bytes": 1,
        "device_type": "mobile",
        "storage_path": "mobile/mobile_1.mp4"
    }"#;

    let row: RecordingDescriptor = serde_json::from_str(json).unwrap();
    assert_eq!(row.status, DescriptorStatus::Uploaded);
}

#[test]
fn test_device_type_parsing() {
    assert_eq!("web".parse::<DeviceType>(), Ok(DeviceType::Web));
    assert_eq!("Mobile".parse::<DeviceType>(), Ok(DeviceType::Mobile));
    assert!("desktop".parse::<DeviceType>().is_err());
}
