//! Capture mode and media value objects

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidSettingError;

/// Kind of media a device produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a controller records. Fixed for the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureMode {
    Video,
    #[default]
    Audio,
}

impl CaptureMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }

    /// Media kinds whose permission must be granted before setup.
    /// Audio is always requested first.
    pub const fn required_media(&self) -> &'static [MediaKind] {
        match self {
            Self::Video => &[MediaKind::Audio, MediaKind::Video],
            Self::Audio => &[MediaKind::Audio],
        }
    }

    /// Presets in order of preference
    pub const fn preferred_presets(&self) -> &'static [SessionPreset] {
        match self {
            Self::Video => &[SessionPreset::Hd1920x1080, SessionPreset::High],
            Self::Audio => &[SessionPreset::High],
        }
    }

    /// Container extension of the recorded file
    pub const fn file_extension(&self) -> &'static str {
        match self {
            Self::Video => "mp4",
            Self::Audio => "m4a",
        }
    }

    pub const fn captures_video(&self) -> bool {
        matches!(self, Self::Video)
    }
}

impl FromStr for CaptureMode {
    type Err = InvalidSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            _ => Err(InvalidSettingError {
                setting: "mode",
                input: s.to_string(),
                expected: "video, audio",
            }),
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Physical position of a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DevicePosition {
    #[default]
    Front,
    Back,
    Unspecified,
}

impl DevicePosition {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Unspecified => "unspecified",
        }
    }
}

impl FromStr for DevicePosition {
    type Err = InvalidSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            "unspecified" => Ok(Self::Unspecified),
            _ => Err(InvalidSettingError {
                setting: "video position",
                input: s.to_string(),
                expected: "front, back, unspecified",
            }),
        }
    }
}

impl fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPreset {
    Hd1920x1080,
    High,
}

impl fmt::Display for SessionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hd1920x1080 => write!(f, "hd-1920x1080"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Rotation applied to a video connection, in degrees clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationAngle {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl RotationAngle {
    pub const fn degrees(&self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

impl FromStr for RotationAngle {
    type Err = InvalidSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Self::Deg0),
            "90" => Ok(Self::Deg90),
            "180" => Ok(Self::Deg180),
            "270" => Ok(Self::Deg270),
            _ => Err(InvalidSettingError {
                setting: "rotation",
                input: s.to_string(),
                expected: "0, 90, 180, 270",
            }),
        }
    }
}

impl fmt::Display for RotationAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// Why the capture hardware was taken away from the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterruptionReason {
    /// Another client is using the device
    DeviceInUseByAnotherClient(MediaKind),
    /// Video capture is not available while backgrounded
    VideoUnavailableInBackground,
    /// The system is throttling capture (thermal or power pressure)
    SystemPressure,
    /// Platform-specific reason that has no dedicated variant
    Other(String),
}

impl fmt::Display for InterruptionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceInUseByAnotherClient(kind) => {
                write!(f, "{} device in use by another client", kind)
            }
            Self::VideoUnavailableInBackground => write!(f, "video unavailable in background"),
            Self::SystemPressure => write!(f, "system pressure"),
            Self::Other(reason) => write!(f, "{}", reason),
        }
    }
}
