//! Sink forwarding notifications into a tokio channel

use std::path::Path;

use tokio::sync::mpsc;

use crate::application::ports::{NotificationSink, SessionNotification};
use crate::domain::capture::InterruptionReason;
use crate::domain::error::CaptureError;

/// Turns callbacks on the capture worker into owned messages for async code
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SessionNotification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, notification: SessionNotification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}

impl NotificationSink for ChannelSink {
    fn recording_did_start(&self) {
        self.forward(SessionNotification::RecordingStarted);
    }

    fn recording_did_stop(&self, url: Option<&Path>, error: Option<&CaptureError>) {
        self.forward(SessionNotification::RecordingStopped {
            url: url.map(Path::to_path_buf),
            error: error.cloned(),
        });
    }

    fn recording_service_failed(&self, error: &CaptureError) {
        self.forward(SessionNotification::ServiceFailed(error.clone()));
    }

    fn recording_session_interrupted(&self, reason: Option<&InterruptionReason>) {
        self.forward(SessionNotification::Interrupted(reason.cloned()));
    }

    fn recording_session_interruption_ended(&self) {
        self.forward(SessionNotification::InterruptionEnded);
    }
}
