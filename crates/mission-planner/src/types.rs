use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One planned tool invocation. Immutable once produced by the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// What the planner returned for one command: assistant text plus zero or
/// more ordered tool calls. An empty plan is a valid, purely conversational
/// reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerResponse {
    pub assistant_text: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl PlannerResponse {
    pub fn text(assistant_text: impl Into<String>) -> Self {
        Self {
            assistant_text: assistant_text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_calls(assistant_text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            assistant_text: assistant_text.into(),
            tool_calls,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior turn of the conversation, handed back to the planner as context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
