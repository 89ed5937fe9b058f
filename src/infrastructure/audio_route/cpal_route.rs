//! Audio route backed by the cpal default host
//!
//! Desktop hosts have no process-wide audio session to reconfigure. The
//! route is accepted when the host exposes a usable default input device.

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::application::ports::{AudioRoute, AudioRouteError, AudioRouteRequest};

/// Audio route that validates the default cpal input
#[derive(Debug, Default)]
pub struct CpalAudioRoute;

impl CpalAudioRoute {
    pub fn new() -> Self {
        Self
    }

    fn probe() -> Result<String, AudioRouteError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AudioRouteError("no default audio input device".to_string()))?;
        device
            .default_input_config()
            .map_err(|e| AudioRouteError(format!("input device unusable: {}", e)))?;
        Ok(device.name().unwrap_or_else(|_| "unknown".to_string()))
    }
}

#[async_trait]
impl AudioRoute for CpalAudioRoute {
    async fn configure(&self, request: AudioRouteRequest) -> Result<(), AudioRouteError> {
        // Host enumeration can block on some backends
        let device = tokio::task::spawn_blocking(Self::probe)
            .await
            .map_err(|e| AudioRouteError(format!("task join error: {}", e)))??;

        tracing::debug!(route = %request, %device, "Audio route ready");
        Ok(())
    }
}
