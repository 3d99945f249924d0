use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Reasons a command is rejected before any processing starts. Failures
/// during processing are reported through the execution record and the
/// event stream instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("command text is empty")]
    EmptyCommand,
    #[error("another command is still being processed")]
    Busy,
}
