use serde::{Deserialize, Serialize};

/// Estimated position relative to the most recent takeoff point, in
/// centimeters, with heading in degrees (0-359).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub heading: f32,
}

impl Position {
    pub const HOME: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        heading: 0.0,
    };

    /// Straight-line distance from the takeoff point.
    pub fn distance_from_home(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub(crate) fn apply(&mut self, delta: MotionDelta) {
        self.x += delta.dx;
        self.y += delta.dy;
        self.z += delta.dz;
        self.heading = (self.heading + delta.dheading).rem_euclid(360.0);
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::HOME
    }
}

/// A single motion update: a translation in centimeters and/or a heading
/// change in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionDelta {
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
    pub dheading: f32,
}

impl MotionDelta {
    pub fn translation(dx: f32, dy: f32, dz: f32) -> Self {
        Self {
            dx,
            dy,
            dz,
            dheading: 0.0,
        }
    }

    pub fn rotation(degrees: f32) -> Self {
        Self {
            dheading: degrees,
            ..Self::default()
        }
    }
}
