//! Domain layer - Core capture logic
//!
//! Contains value objects, the session/recording state machines and errors.
//! This layer has no dependencies on external systems.

pub mod capture;
pub mod config;
pub mod error;
pub mod recording;

// Re-export common types
pub use capture::{
    CaptureMode, MediaKind, RecordingState, RecordingTarget, SessionState,
};
pub use config::AppConfig;
pub use error::*;
pub use recording::RecordingLength;
