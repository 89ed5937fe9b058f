//! Orientation provider with a configured angle

use crate::application::ports::OrientationProvider;
use crate::domain::capture::RotationAngle;

/// Reports the same rotation for every recording
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedOrientation {
    angle: RotationAngle,
}

impl FixedOrientation {
    pub fn new(angle: RotationAngle) -> Self {
        Self { angle }
    }
}

impl OrientationProvider for FixedOrientation {
    fn current_rotation(&self) -> RotationAngle {
        self.angle
    }
}
