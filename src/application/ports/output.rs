//! File output port interface

use std::path::Path;
use std::sync::Arc;

use crate::domain::capture::RotationAngle;

/// Video stabilization setting of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StabilizationMode {
    #[default]
    Off,
    Auto,
}

/// The video connection feeding a file output
pub trait VideoConnection: Send + Sync {
    fn supports_stabilization(&self) -> bool;

    fn set_stabilization(&self, mode: StabilizationMode);

    fn supports_rotation(&self, angle: RotationAngle) -> bool;

    fn set_rotation(&self, angle: RotationAngle);
}

/// Receiver of recording completion events.
///
/// Called on an arbitrary thread chosen by the output.
pub trait RecordingObserver: Send + Sync {
    fn did_start_recording(&self, path: &Path);

    /// `path` is what the output wrote to; `error` is set when the
    /// recording ended abnormally
    fn did_finish_recording(&self, path: &Path, error: Option<String>);
}

/// Port for the sink writing captured media to a file
pub trait FileOutput: Send + Sync {
    fn is_recording(&self) -> bool;

    /// Connection carrying video, if a video input is wired
    fn video_connection(&self) -> Option<Arc<dyn VideoConnection>>;

    /// Begin writing to `path`, reporting progress to `observer`
    fn start_recording(&self, path: &Path, observer: Arc<dyn RecordingObserver>);

    fn stop_recording(&self);
}
