//! mission-planner: Language-model planner adapter
//!
//! Turns a natural-language command plus conversation context and the tool
//! catalogue into an ordered plan of tool calls. The execution engine only
//! sees the [`Planner`] trait; behind it sits either the scripted mock or an
//! OpenAI-compatible chat-completions client (`http` feature).

mod error;
pub use error::{Error, Result};

mod types;
pub use types::{ConversationTurn, PlannerResponse, Role, ToolCall};

mod traits;
pub use traits::Planner;

mod mock;
pub use mock::MockPlanner;

#[cfg(feature = "http")]
mod openai;
#[cfg(feature = "http")]
pub use openai::{OpenAiPlanner, PlannerConfig};
