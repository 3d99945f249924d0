use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle of one tool call within a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Pending,
    Executing,
    Success,
    Error,
}

/// Outcome of one tool call, in plan order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionRecord {
    /// 1-based position in the plan.
    pub index: usize,
    pub total: usize,
    pub tool: String,
    pub arguments: Value,
    pub status: ToolStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolExecutionRecord {
    /// Fresh audit entry for one planned call, before anything has run.
    pub fn pending(index: usize, total: usize, tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            index,
            total,
            tool: tool.into(),
            arguments,
            status: ToolStatus::Pending,
            message: String::new(),
            data: None,
        }
    }
}

/// Overall disposition of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Processing,
    Success,
    Error,
}

/// Complete record of one processed command: the original text, the
/// planner's reply, and every tool outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandExecution {
    pub id: Uuid,
    pub text: String,
    pub assistant_text: String,
    pub records: Vec<ToolExecutionRecord>,
    pub status: CommandStatus,
    /// Payload of the first successful search match, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovered: Option<Value>,
}

impl CommandExecution {
    pub fn new(id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            assistant_text: String::new(),
            records: Vec::new(),
            status: CommandStatus::Processing,
            discovered: None,
        }
    }

    /// (succeeded, failed) tool counts.
    pub fn counts(&self) -> (usize, usize) {
        let succeeded = self
            .records
            .iter()
            .filter(|r| r.status == ToolStatus::Success)
            .count();
        let failed = self
            .records
            .iter()
            .filter(|r| r.status == ToolStatus::Error)
            .count();
        (succeeded, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut exec = CommandExecution::new(Uuid::new_v4(), "go");
        for (i, status) in [ToolStatus::Success, ToolStatus::Error, ToolStatus::Success]
            .into_iter()
            .enumerate()
        {
            let mut record = ToolExecutionRecord::pending(i + 1, 3, "move", Value::Null);
            record.status = status;
            exec.records.push(record);
        }
        assert_eq!(exec.counts(), (2, 1));
    }

    #[test]
    fn test_pending_record_starts_unrun() {
        let record = ToolExecutionRecord::pending(1, 4, "takeoff", Value::Null);
        assert_eq!(record.status, ToolStatus::Pending);
        assert!(record.message.is_empty());
        assert!(record.data.is_none());
    }
}
