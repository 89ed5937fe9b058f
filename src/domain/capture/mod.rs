//! Capture domain module

mod lifecycle;
mod media;
mod target;

pub use lifecycle::{
    InvalidStateTransition, RecordingLifecycle, RecordingState, SessionLifecycle, SessionState,
    StopRequest,
};
pub use media::{
    CaptureMode, DevicePosition, InterruptionReason, MediaKind, RotationAngle, SessionPreset,
};
pub use target::RecordingTarget;
