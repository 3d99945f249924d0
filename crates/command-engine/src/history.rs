use crate::CommandExecution;
use mission_planner::ConversationTurn;

/// Conversation and execution history for one operator session.
///
/// Turns feed back into the planner as context; executions are kept for
/// status queries and demos.
#[derive(Default)]
pub struct SessionHistory {
    turns: Vec<ConversationTurn>,
    executions: Vec<CommandExecution>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished command as one user/assistant exchange.
    pub fn record(&mut self, execution: CommandExecution) {
        self.turns.push(ConversationTurn::user(execution.text.clone()));
        if !execution.assistant_text.is_empty() {
            self.turns
                .push(ConversationTurn::assistant(execution.assistant_text.clone()));
        }
        self.executions.push(execution);
    }

    /// The most recent `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> Vec<ConversationTurn> {
        let start = self.turns.len().saturating_sub(n);
        self.turns[start..].to_vec()
    }

    pub fn executions(&self) -> &[CommandExecution] {
        &self.executions
    }

    pub fn last_execution(&self) -> Option<&CommandExecution> {
        self.executions.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandStatus;
    use uuid::Uuid;

    #[test]
    fn test_recent_turns_window() {
        let mut history = SessionHistory::new();
        for i in 0..4 {
            let mut exec = CommandExecution::new(Uuid::new_v4(), format!("command {i}"));
            exec.assistant_text = format!("reply {i}");
            exec.status = CommandStatus::Success;
            history.record(exec);
        }

        assert_eq!(history.executions().len(), 4);
        let recent = history.recent_turns(4);
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].content, "command 2");
        assert_eq!(recent[3].content, "reply 3");
    }

    #[test]
    fn test_empty_assistant_text_skipped() {
        let mut history = SessionHistory::new();
        history.record(CommandExecution::new(Uuid::new_v4(), "hello"));
        assert_eq!(history.recent_turns(10).len(), 1);
    }
}
