//! Audio route that accepts every request

use async_trait::async_trait;

use crate::application::ports::{AudioRoute, AudioRouteError, AudioRouteRequest};

/// Used with backends that own their audio path
#[derive(Debug, Default)]
pub struct PassthroughAudioRoute;

impl PassthroughAudioRoute {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioRoute for PassthroughAudioRoute {
    async fn configure(&self, request: AudioRouteRequest) -> Result<(), AudioRouteError> {
        tracing::debug!(route = %request, "Audio route accepted");
        Ok(())
    }
}
