//! Sink broadcasting to several sinks in order

use std::path::Path;
use std::sync::Arc;

use crate::application::ports::NotificationSink;
use crate::domain::capture::InterruptionReason;
use crate::domain::error::CaptureError;

#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl NotificationSink for FanoutSink {
    fn recording_did_start(&self) {
        self.sinks.iter().for_each(|s| s.recording_did_start());
    }

    fn recording_did_stop(&self, url: Option<&Path>, error: Option<&CaptureError>) {
        self.sinks.iter().for_each(|s| s.recording_did_stop(url, error));
    }

    fn recording_service_failed(&self, error: &CaptureError) {
        self.sinks.iter().for_each(|s| s.recording_service_failed(error));
    }

    fn recording_session_interrupted(&self, reason: Option<&InterruptionReason>) {
        self.sinks
            .iter()
            .for_each(|s| s.recording_session_interrupted(reason));
    }

    fn recording_session_interruption_ended(&self) {
        self.sinks
            .iter()
            .for_each(|s| s.recording_session_interruption_ended());
    }
}
