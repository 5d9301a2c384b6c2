//! Upload client contract and implementations
//!
//! The controller hands a finished artifact to an [`Uploader`], which stores the
//! bytes under `{device}/{device}_{millis}.{ext}` and writes a descriptor row.

pub mod client;
pub mod descriptor;
pub mod memory;
pub mod path;
pub mod rest;

pub use client::{prepare_descriptor, Uploader};
pub use descriptor::{DescriptorStatus, DeviceType, NewDescriptor, RecordingDescriptor};
pub use memory::MemoryUploader;
pub use path::{extension_for, storage_path};
pub use rest::{RestUploader, RestUploaderConfig};
