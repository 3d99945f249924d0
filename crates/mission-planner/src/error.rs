use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Planner adapter failures. All of them terminate the command before any
/// tool runs; none of them are recoverable mid-plan.
#[derive(Debug, Error)]
pub enum Error {
    #[error("planner transport error: {0}")]
    Transport(String),
    #[error("planner API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("planner returned an unusable response: {0}")]
    InvalidResponse(String),
}
