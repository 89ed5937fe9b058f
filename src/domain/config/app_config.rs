//! Application configuration value object

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::capture::{CaptureMode, DevicePosition, RotationAngle};
use crate::domain::error::InvalidSettingError;
use crate::domain::recording::RecordingLength;

/// Default base name of recorded files
pub const DEFAULT_RECORDING_NAME: &str = "recording";

/// Default log filter when neither RUST_LOG nor config set one
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// How a permission request for one media kind is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPolicy {
    #[default]
    Granted,
    Denied,
    Restricted,
    /// Ask interactively the first time access is needed
    Prompt,
}

impl AccessPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Restricted => "restricted",
            Self::Prompt => "prompt",
        }
    }
}

impl FromStr for AccessPolicy {
    type Err = InvalidSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            "restricted" => Ok(Self::Restricted),
            "prompt" => Ok(Self::Prompt),
            _ => Err(InvalidSettingError {
                setting: "access policy",
                input: s.to_string(),
                expected: "granted, denied, restricted, prompt",
            }),
        }
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub mode: Option<String>,
    pub name: Option<String>,
    pub output_dir: Option<String>,
    pub duration: Option<String>,
    pub video_position: Option<String>,
    pub rotation: Option<String>,
    pub camera_access: Option<String>,
    pub microphone_access: Option<String>,
    pub notify: Option<bool>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            mode: Some(CaptureMode::default().to_string()),
            name: Some(DEFAULT_RECORDING_NAME.to_string()),
            output_dir: Some(default_output_dir().to_string_lossy().into_owned()),
            duration: Some(RecordingLength::default().to_string()),
            video_position: Some(DevicePosition::default().to_string()),
            rotation: Some(RotationAngle::default().to_string()),
            camera_access: Some(AccessPolicy::default().to_string()),
            microphone_access: Some(AccessPolicy::default().to_string()),
            notify: Some(false),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            mode: other.mode.or(self.mode),
            name: other.name.or(self.name),
            output_dir: other.output_dir.or(self.output_dir),
            duration: other.duration.or(self.duration),
            video_position: other.video_position.or(self.video_position),
            rotation: other.rotation.or(self.rotation),
            camera_access: other.camera_access.or(self.camera_access),
            microphone_access: other.microphone_access.or(self.microphone_access),
            notify: other.notify.or(self.notify),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Get mode, or audio if not set/invalid
    pub fn mode_or_default(&self) -> CaptureMode {
        parse_or_default(&self.mode)
    }

    /// Get the recording base name, or "recording" if not set
    pub fn name_or_default(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(DEFAULT_RECORDING_NAME)
    }

    /// Get the output directory, or the platform default if not set
    pub fn output_dir_or_default(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_output_dir)
    }

    /// Get duration as a parsed RecordingLength, or default if not set/invalid
    pub fn duration_or_default(&self) -> RecordingLength {
        parse_or_default(&self.duration)
    }

    pub fn video_position_or_default(&self) -> DevicePosition {
        parse_or_default(&self.video_position)
    }

    pub fn rotation_or_default(&self) -> RotationAngle {
        parse_or_default(&self.rotation)
    }

    pub fn camera_access_or_default(&self) -> AccessPolicy {
        parse_or_default(&self.camera_access)
    }

    pub fn microphone_access_or_default(&self) -> AccessPolicy {
        parse_or_default(&self.microphone_access)
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    pub fn log_level_or_default(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

fn parse_or_default<T: FromStr + Default>(value: &Option<String>) -> T {
    value
        .as_ref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

/// Platform video directory, falling back to home then the working directory
pub fn default_output_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("media-capture")
}
