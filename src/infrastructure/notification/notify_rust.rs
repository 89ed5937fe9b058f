//! Desktop notification sink using notify-rust
//!
//! Works on Windows, macOS, and Linux.

use std::path::Path;
use std::thread;

use tokio::runtime::Handle;

use crate::application::ports::NotificationSink;
use crate::domain::capture::InterruptionReason;
use crate::domain::error::CaptureError;

const ICON_RECORD: &str = "media-record";
const ICON_STOP: &str = "media-playback-stop";
const ICON_ERROR: &str = "dialog-error";
const ICON_WARNING: &str = "dialog-warning";

/// Shows recording events as desktop notifications
pub struct DesktopSink {
    app_name: String,
    runtime: Option<Handle>,
}

impl DesktopSink {
    /// Create a sink; uses the current tokio runtime for blocking work when
    /// there is one
    pub fn new() -> Self {
        Self::with_app_name("Media Capture")
    }

    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            runtime: Handle::try_current().ok(),
        }
    }

    fn show(&self, summary: &str, body: &str, icon: &'static str) {
        let app_name = self.app_name.clone();
        let summary = summary.to_owned();
        let body = body.to_owned();

        // show() can block on the notification daemon
        let task = move || {
            if let Err(e) = notify_rust::Notification::new()
                .appname(&app_name)
                .summary(&summary)
                .body(&body)
                .icon(icon)
                .show()
            {
                tracing::warn!(error = %e, "Desktop notification failed");
            }
        };

        match &self.runtime {
            Some(runtime) => {
                runtime.spawn_blocking(task);
            }
            None => {
                if let Err(e) = thread::Builder::new()
                    .name("desktop-notify".to_string())
                    .spawn(task)
                {
                    tracing::warn!(error = %e, "Failed to spawn notification thread");
                }
            }
        }
    }
}

impl Default for DesktopSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for DesktopSink {
    fn recording_did_start(&self) {
        self.show("Recording", "Capture started", ICON_RECORD);
    }

    fn recording_did_stop(&self, url: Option<&Path>, error: Option<&CaptureError>) {
        match (error, url) {
            (Some(error), _) => self.show("Recording failed", &error.to_string(), ICON_ERROR),
            (None, Some(url)) => self.show(
                "Recording saved",
                &url.display().to_string(),
                ICON_STOP,
            ),
            (None, None) => self.show("Recording stopped", "", ICON_STOP),
        }
    }

    fn recording_service_failed(&self, error: &CaptureError) {
        self.show("Capture unavailable", &error.to_string(), ICON_ERROR);
    }

    fn recording_session_interrupted(&self, reason: Option<&InterruptionReason>) {
        let body = reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unknown reason".to_string());
        self.show("Capture interrupted", &body, ICON_WARNING);
    }

    fn recording_session_interruption_ended(&self) {
        self.show("Capture resumed", "", ICON_RECORD);
    }
}
