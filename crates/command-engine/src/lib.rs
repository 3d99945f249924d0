//! command-engine: Natural-language command orchestration
//!
//! Ties the planner, the tool registry, and the abort signal together into
//! the one-command-at-a-time pipeline: accept text, plan tool calls, run
//! them in order, and stream [`CommandEvent`]s for every step along the way.

mod error;
pub use error::{Error, Result};

mod execution;
pub use execution::{CommandExecution, CommandStatus, ToolExecutionRecord, ToolStatus};

mod events;
pub use events::{CommandEvent, EventBus};

mod history;
pub use history::SessionHistory;

mod engine;
pub use engine::{forward_state_changes, CommandEngine};
