use crate::{Detection, Direction, FlipDirection, Frame, Result};

/// Motion capability of the vehicle.
///
/// Implementations are hardware bindings or simulations with identical
/// contracts; the controller holds exactly one behind a lock. Distances are
/// centimeters, rotations degrees (positive = clockwise).
pub trait MotionDriver: Send {
    fn takeoff(&mut self) -> Result<()>;
    fn land(&mut self) -> Result<()>;
    fn translate(&mut self, direction: Direction, distance_cm: u32) -> Result<()>;
    fn rotate(&mut self, degrees: i32) -> Result<()>;
    fn flip(&mut self, direction: FlipDirection) -> Result<()>;

    /// Cancel residual motion and hold position.
    fn hover(&mut self) -> Result<()>;

    fn battery_pct(&self) -> u8;
    fn height_cm(&self) -> i32;
}

/// Vision capability: capture a frame and classify it against a free-text
/// description.
pub trait VisionDriver: Send {
    fn capture(&mut self) -> Result<Frame>;
    fn classify(&mut self, frame: &Frame, description: &str) -> Result<Detection>;
}
