//! Sink that logs every notification

use std::path::Path;

use crate::application::ports::NotificationSink;
use crate::domain::capture::InterruptionReason;
use crate::domain::error::CaptureError;

#[derive(Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for TracingSink {
    fn recording_did_start(&self) {
        tracing::info!("Recording did start");
    }

    fn recording_did_stop(&self, url: Option<&Path>, error: Option<&CaptureError>) {
        let url = url.map(|u| u.display().to_string()).unwrap_or_default();
        match error {
            Some(error) => tracing::warn!(%url, %error, "Recording did stop with error"),
            None => tracing::info!(%url, "Recording did stop"),
        }
    }

    fn recording_service_failed(&self, error: &CaptureError) {
        tracing::warn!(%error, "Recording service failed");
    }

    fn recording_session_interrupted(&self, reason: Option<&InterruptionReason>) {
        tracing::warn!(reason = ?reason, "Recording session interrupted");
    }

    fn recording_session_interruption_ended(&self) {
        tracing::info!("Recording session interruption ended");
    }
}
