use super::descriptor::DeviceType;

/// File extension for a recorder content type
///
/// Anything that is not WebM is stored as MP4.
pub fn extension_for(content_type: &str) -> &'static str {
    if content_type.contains("webm") {
        "webm"
    } else {
        "mp4"
    }
}

/// Object storage path: `{device}/{device}_{unix_millis}.{ext}`
pub fn storage_path(device_type: DeviceType, unix_millis: i64, content_type: &str) -> String {
    format!(
        "{device}/{device}_{millis}.{ext}",
        device = device_type.as_str(),
        millis = unix_millis,
        ext = extension_for(content_type)
    )
}
