use crate::FlightState;
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: FlightState, to: FlightState },
    #[error("motion update not allowed in state {0:?}")]
    MotionNotAllowed(FlightState),
}
