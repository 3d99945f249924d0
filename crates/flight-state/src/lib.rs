//! flight-state: Flight state machine and position tracking
//!
//! Sole owner of the vehicle's discrete flight state and its dead-reckoned
//! position estimate. All mutation goes through [`StateMachine`]; tool code
//! never writes state or position fields directly.

mod error;
pub use error::{Error, Result};

mod position;
pub use position::{MotionDelta, Position};

mod machine;
pub use machine::{FlightState, StateMachine};
