use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("already flying")]
    AlreadyFlying,
    #[error("drone is not flying")]
    NotFlying,
    #[error("battery at {pct}%, below the {floor}% floor")]
    BatteryLow { pct: u8, floor: u8 },
    #[error("move would exceed the {limit_cm}cm height ceiling")]
    HeightLimit { limit_cm: i32 },
    #[error(transparent)]
    State(#[from] flight_state::Error),
    #[error(transparent)]
    Interrupted(#[from] abort_signal::Interrupted),
    #[error("driver fault: {0}")]
    Driver(String),
}
