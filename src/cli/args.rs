//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::capture::{CaptureMode, DevicePosition, RotationAngle};
use crate::domain::config::{AccessPolicy, AppConfig};
use crate::domain::recording::RecordingLength;

/// media-capture - record audio or video clips through a capture session
#[derive(Parser, Debug)]
#[command(name = "media-capture")]
#[command(version)]
#[command(about = "Record audio or video clips through a serialized capture session")]
#[command(long_about = None)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record one clip
    Record(RecordArgs),
    /// List capture devices
    Devices {
        /// List the built-in virtual devices instead of the host's
        #[arg(long = "virtual")]
        virtual_devices: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `record`
#[derive(Args, Debug, Default)]
pub struct RecordArgs {
    /// What to capture
    #[arg(short = 'm', long, value_name = "MODE")]
    pub mode: Option<ModeArg>,

    /// Base name of the recorded file
    #[arg(short = 'n', long, value_name = "NAME")]
    pub name: Option<String>,

    /// Recording length (e.g., 10s, 1m, 2m30s)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Directory receiving the file
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Camera to use in video mode
    #[arg(long, value_name = "POSITION")]
    pub camera: Option<PositionArg>,

    /// Show desktop notifications
    #[arg(long)]
    pub notify: bool,

    /// Use the built-in virtual devices
    #[arg(long = "virtual")]
    pub virtual_devices: bool,
}

impl RecordArgs {
    /// The part of the configuration given on the command line
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            mode: self.mode.map(|m| CaptureMode::from(m).to_string()),
            name: self.name.clone(),
            output_dir: self
                .output_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().into_owned()),
            duration: self.duration.clone(),
            video_position: self.camera.map(|p| DevicePosition::from(p).to_string()),
            notify: if self.notify { Some(true) } else { None },
            ..Default::default()
        }
    }
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Capture mode argument
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Video,
    Audio,
}

impl From<ModeArg> for CaptureMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Video => CaptureMode::Video,
            ModeArg::Audio => CaptureMode::Audio,
        }
    }
}

/// Camera position argument
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PositionArg {
    Front,
    Back,
}

impl From<PositionArg> for DevicePosition {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::Front => DevicePosition::Front,
            PositionArg::Back => DevicePosition::Back,
        }
    }
}

/// Parsed record options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub mode: CaptureMode,
    pub name: String,
    pub duration: RecordingLength,
    pub output_dir: PathBuf,
    pub video_position: DevicePosition,
    pub rotation: RotationAngle,
    pub camera_access: AccessPolicy,
    pub microphone_access: AccessPolicy,
    pub notify: bool,
    pub virtual_devices: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "mode",
    "name",
    "output_dir",
    "duration",
    "video_position",
    "rotation",
    "camera_access",
    "microphone_access",
    "notify",
    "log_level",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
