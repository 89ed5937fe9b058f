//! Device discovery using cpal
//!
//! cpal only knows audio devices. Video lookups go to an optional
//! fallback discovery.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::application::ports::{CaptureDevice, DeviceDiscovery};
use crate::domain::capture::{DevicePosition, MediaKind};

/// Audio input discovery on the default cpal host
#[derive(Default)]
pub struct CpalDeviceDiscovery {
    video: Option<Box<dyn DeviceDiscovery>>,
}

impl CpalDeviceDiscovery {
    pub fn new() -> Self {
        Self { video: None }
    }

    /// Answer video lookups with `video`
    pub fn with_video_fallback(video: impl DeviceDiscovery + 'static) -> Self {
        Self {
            video: Some(Box::new(video)),
        }
    }

    fn to_device(index: usize, name: String) -> CaptureDevice {
        CaptureDevice {
            id: format!("cpal:{}", index),
            name,
            kind: MediaKind::Audio,
            // Desktop microphones carry no position
            position: DevicePosition::Unspecified,
        }
    }

    fn audio_inputs() -> Vec<CaptureDevice> {
        let host = cpal::default_host();
        let devices = match host.input_devices() {
            Ok(devices) => devices,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to enumerate audio inputs");
                return Vec::new();
            }
        };

        devices
            .enumerate()
            .map(|(index, device)| {
                let name = device
                    .name()
                    .unwrap_or_else(|_| format!("input {}", index));
                Self::to_device(index, name)
            })
            .collect()
    }

    fn default_audio_input() -> Option<CaptureDevice> {
        let device = cpal::default_host().default_input_device()?;
        let name = device.name().ok()?;

        // Reuse the enumerated id so list() and find() agree
        Self::audio_inputs()
            .into_iter()
            .find(|d| d.name == name)
            .or_else(|| Some(Self::to_device(0, name)))
    }
}

impl DeviceDiscovery for CpalDeviceDiscovery {
    fn find(&self, kind: MediaKind, position: DevicePosition) -> Option<CaptureDevice> {
        match kind {
            MediaKind::Audio => Self::default_audio_input(),
            MediaKind::Video => self.video.as_ref()?.find(kind, position),
        }
    }

    fn list(&self, kind: MediaKind) -> Vec<CaptureDevice> {
        match kind {
            MediaKind::Audio => Self::audio_inputs(),
            MediaKind::Video => self
                .video
                .as_ref()
                .map(|video| video.list(kind))
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::capture::VirtualDeviceDiscovery;

    #[test]
    fn video_without_fallback_finds_nothing() {
        let discovery = CpalDeviceDiscovery::new();
        assert!(discovery
            .find(MediaKind::Video, DevicePosition::Front)
            .is_none());
        assert!(discovery.list(MediaKind::Video).is_empty());
    }

    #[test]
    fn video_uses_fallback() {
        let discovery = CpalDeviceDiscovery::with_video_fallback(VirtualDeviceDiscovery::new());
        let camera = discovery
            .find(MediaKind::Video, DevicePosition::Back)
            .unwrap();
        assert_eq!(camera.position, DevicePosition::Back);
        assert_eq!(discovery.list(MediaKind::Video).len(), 2);
    }
}
