use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}
