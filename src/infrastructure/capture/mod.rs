//! Capture backends and device discovery

mod cpal_discovery;
mod virtual_backend;

pub use cpal_discovery::CpalDeviceDiscovery;
pub use virtual_backend::{
    VirtualBackendOptions, VirtualCaptureBackend, VirtualControls, VirtualDeviceDiscovery,
    VirtualFileOutput, VirtualVideoConnection,
};
