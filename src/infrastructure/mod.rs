//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces: capture backends,
//! device discovery, permissions, audio routing, notification sinks and
//! config storage.

pub mod audio_route;
pub mod capture;
pub mod clock;
pub mod config;
pub mod notification;
pub mod orientation;
pub mod permissions;

// Re-export adapters
pub use audio_route::{CpalAudioRoute, PassthroughAudioRoute};
pub use capture::{CpalDeviceDiscovery, VirtualCaptureBackend, VirtualDeviceDiscovery};
pub use clock::SystemClock;
pub use config::XdgConfigStore;
pub use notification::{ChannelSink, DesktopSink, FanoutSink, TracingSink};
pub use orientation::FixedOrientation;
pub use permissions::PolicyPermissions;
