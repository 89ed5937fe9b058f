//! Domain error types

use thiserror::Error;

use crate::domain::capture::MediaKind;

/// Closed set of failures reported by the capture core.
///
/// Synchronous contract violations are returned from the invoking call;
/// asynchronous failures reach the caller only through the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Permission denied for {0} capture")]
    PermissionDenied(MediaKind),

    #[error("Capture setup failed: {0}")]
    SetupFailed(String),

    #[error("No {0} capture device found")]
    DeviceNotFound(MediaKind),

    #[error("Input/output error: {0}")]
    InputOutputError(String),

    #[error("A recording is already in progress")]
    RecordingInProgress,

    #[error("Recording failed{}", .0.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
    RecordingFailed(Option<String>),

    #[error("File system error: {0}")]
    FileSystemError(String),

    #[error("Capture session is not running")]
    SessionNotRunning,

    #[error("Unknown capture error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Shorthand for `SetupFailed`
    pub fn setup(reason: impl Into<String>) -> Self {
        Self::SetupFailed(reason.into())
    }

    /// Shorthand for `InputOutputError`
    pub fn io(reason: impl Into<String>) -> Self {
        Self::InputOutputError(reason.into())
    }

    /// Wrap an underlying recording error, if any
    pub fn recording(underlying: Option<impl Into<String>>) -> Self {
        Self::RecordingFailed(underlying.map(Into::into))
    }
}

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected seconds or h/m/s units (e.g., 30, 30s, 2m30s, 1h)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a textual capture setting cannot be parsed
#[derive(Debug, Clone, Error)]
#[error("Invalid {setting}: \"{input}\". Valid values: {expected}")]
pub struct InvalidSettingError {
    pub setting: &'static str,
    pub input: String,
    pub expected: &'static str,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
