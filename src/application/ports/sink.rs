//! Notification sink port interface
//!
//! The caller-facing callback surface of the session controller.

use std::path::{Path, PathBuf};

use crate::domain::capture::InterruptionReason;
use crate::domain::error::CaptureError;

/// Port receiving session and recording notifications.
///
/// Invoked on the controller's worker thread. Implementations must return
/// promptly and must not wait on a controller call from inside a callback.
pub trait NotificationSink: Send + Sync {
    fn recording_did_start(&self);

    /// `url` is the recorded file, `error` is set if the recording failed
    fn recording_did_stop(&self, url: Option<&Path>, error: Option<&CaptureError>);

    fn recording_service_failed(&self, error: &CaptureError);

    fn recording_session_interrupted(&self, reason: Option<&InterruptionReason>);

    fn recording_session_interruption_ended(&self);
}

/// Owned form of a sink callback, for forwarding across tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotification {
    RecordingStarted,
    RecordingStopped {
        url: Option<PathBuf>,
        error: Option<CaptureError>,
    },
    ServiceFailed(CaptureError),
    Interrupted(Option<InterruptionReason>),
    InterruptionEnded,
}

impl SessionNotification {
    /// Replay this notification into a sink
    pub fn deliver(&self, sink: &dyn NotificationSink) {
        match self {
            Self::RecordingStarted => sink.recording_did_start(),
            Self::RecordingStopped { url, error } => {
                sink.recording_did_stop(url.as_deref(), error.as_ref())
            }
            Self::ServiceFailed(error) => sink.recording_service_failed(error),
            Self::Interrupted(reason) => sink.recording_session_interrupted(reason.as_ref()),
            Self::InterruptionEnded => sink.recording_session_interruption_ended(),
        }
    }
}
