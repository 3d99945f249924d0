//! drone-drivers: Capability drivers and the high-level drone controller
//!
//! This crate defines the narrow motion/vision driver interfaces the rest of
//! the system flies against, deterministic mock implementations of both, and
//! [`DroneController`], which binds the drivers to the flight state machine
//! and the abort signal. Everything above this crate treats the vehicle as a
//! set of typed capabilities; nothing above it talks to hardware directly.

mod error;
pub use error::{Error, Result};

mod types;
pub use types::{
    Detection, Direction, DroneStatus, FlipDirection, Frame, ReturnHomeOutcome, SafetyLimits,
    SearchOutcome,
};

mod traits;
pub use traits::{MotionDriver, VisionDriver};

mod mock;
pub use mock::{FaultInjector, MockMotion, MockVision};

mod controller;
pub use controller::DroneController;
