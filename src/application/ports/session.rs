//! Capture session and device port interfaces
//!
//! Hardware reconfiguration is synchronous and only ever driven from the
//! controller's serialized worker, so these traits take `&mut self` and
//! need `Send` but not `Sync`.

use std::sync::Arc;

use crate::domain::capture::{
    DevicePosition, InterruptionReason, MediaKind, RotationAngle, SessionPreset,
};

use super::output::FileOutput;

/// A physical or virtual capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDevice {
    pub id: String,
    pub name: String,
    pub kind: MediaKind,
    pub position: DevicePosition,
}

/// Handle binding a device to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInput {
    device: CaptureDevice,
}

impl DeviceInput {
    pub fn new(device: CaptureDevice) -> Self {
        Self { device }
    }

    pub fn kind(&self) -> MediaKind {
        self.device.kind
    }

    pub fn device(&self) -> &CaptureDevice {
        &self.device
    }
}

/// Asynchronous session events. Delivered on an arbitrary thread.
pub trait SessionObserver: Send + Sync {
    /// The session hit an unrecoverable runtime error
    fn runtime_error(&self, reason: String);

    /// Capture hardware was taken away from the session
    fn interrupted(&self, reason: Option<InterruptionReason>);

    /// Hardware access came back
    fn interruption_ended(&self);
}

/// Port for the runtime object wiring inputs to outputs
pub trait CaptureSession: Send {
    /// Open a configuration transaction; changes apply on commit
    fn begin_configuration(&mut self);

    fn commit_configuration(&mut self);

    fn can_set_preset(&self, preset: SessionPreset) -> bool;

    fn set_preset(&mut self, preset: SessionPreset);

    fn can_add_input(&self, input: &DeviceInput) -> bool;

    fn add_input(&mut self, input: &DeviceInput);

    fn remove_input(&mut self, input: &DeviceInput);

    fn can_add_output(&self, output: &Arc<dyn FileOutput>) -> bool;

    fn add_output(&mut self, output: Arc<dyn FileOutput>);

    fn remove_output(&mut self, output: &Arc<dyn FileOutput>);

    /// Start the flow of data. Failures surface as runtime errors.
    fn start_running(&mut self);

    fn stop_running(&mut self);

    fn is_running(&self) -> bool;

    /// Route runtime-error and interruption events to `observer`
    fn subscribe(&mut self, observer: Arc<dyn SessionObserver>);

    fn unsubscribe(&mut self);
}

/// Port for locating capture devices
pub trait DeviceDiscovery: Send + Sync {
    /// Find the best device of `kind` at `position`
    fn find(&self, kind: MediaKind, position: DevicePosition) -> Option<CaptureDevice>;

    /// All devices of `kind`
    fn list(&self, kind: MediaKind) -> Vec<CaptureDevice>;
}

/// Port for the current device orientation
pub trait OrientationProvider: Send + Sync {
    fn current_rotation(&self) -> RotationAngle;
}

/// Factory for sessions and outputs of one capture subsystem
pub trait CaptureBackend: Send + Sync {
    fn create_session(&self) -> Box<dyn CaptureSession>;

    fn create_file_output(&self) -> Arc<dyn FileOutput>;
}
