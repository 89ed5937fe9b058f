//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio_route;
pub mod clock;
pub mod config;
pub mod output;
pub mod permissions;
pub mod session;
pub mod sink;

// Re-export common types
pub use audio_route::{
    AudioCategory, AudioMode, AudioRoute, AudioRouteError, AudioRouteOptions, AudioRouteRequest,
};
pub use clock::Clock;
pub use config::ConfigStore;
pub use output::{FileOutput, RecordingObserver, StabilizationMode, VideoConnection};
pub use permissions::{AuthorizationStatus, PermissionProvider};
pub use session::{
    CaptureBackend, CaptureDevice, CaptureSession, DeviceDiscovery, DeviceInput,
    OrientationProvider, SessionObserver,
};
pub use sink::{NotificationSink, SessionNotification};
