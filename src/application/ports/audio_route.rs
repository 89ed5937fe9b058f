//! Audio route port interface

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Audio route errors
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct AudioRouteError(pub String);

/// What the process intends to do with audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCategory {
    Record,
    PlayAndRecord,
}

/// Signal processing profile for the route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioMode {
    Default,
    VideoRecording,
}

/// Route options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioRouteOptions {
    /// Keep other audio playing while capturing
    pub mix_with_others: bool,
    /// Prefer the built-in speaker over the receiver
    pub default_to_speaker: bool,
    /// Allow bluetooth headsets as input
    pub allow_bluetooth: bool,
}

/// A full route request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioRouteRequest {
    pub category: AudioCategory,
    pub mode: AudioMode,
    pub options: AudioRouteOptions,
}

impl fmt::Display for AudioRouteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.category, self.mode)
    }
}

/// Port for configuring the process audio route before capture
#[async_trait]
pub trait AudioRoute: Send + Sync {
    /// Apply the requested category, mode and options.
    ///
    /// # Returns
    /// Ok(()) on success, or the platform's reason for refusing
    async fn configure(&self, request: AudioRouteRequest) -> Result<(), AudioRouteError>;
}
