use crate::{ConversationTurn, Error, Planner, PlannerResponse, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

enum ScriptedReply {
    Reply(PlannerResponse),
    Fail(String),
}

/// Scripted planner for tests and demos.
///
/// Pops one reply per `plan` call; once the script is exhausted it answers
/// with an empty conversational reply.
#[derive(Default)]
pub struct MockPlanner {
    script: Mutex<VecDeque<ScriptedReply>>,
}

impl MockPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<PlannerResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(ScriptedReply::Reply).collect()),
        }
    }

    /// Queue a transport failure as the next reply.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_script()
            .push_back(ScriptedReply::Fail(message.into()));
    }

    pub fn push_response(&self, response: PlannerResponse) {
        self.lock_script().push_back(ScriptedReply::Reply(response));
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedReply>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Planner for MockPlanner {
    async fn plan(
        &self,
        _text: &str,
        _context: &[ConversationTurn],
        _tool_schemas: &[Value],
    ) -> Result<PlannerResponse> {
        match self.lock_script().pop_front() {
            Some(ScriptedReply::Reply(response)) => Ok(response),
            Some(ScriptedReply::Fail(message)) => Err(Error::Transport(message)),
            None => Ok(PlannerResponse::text("(no further scripted replies)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolCall;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let planner = MockPlanner::with_responses(vec![
            PlannerResponse::with_calls("up we go", vec![ToolCall::new("takeoff")]),
            PlannerResponse::text("just chatting"),
        ]);

        let first = planner.plan("take off", &[], &[]).await.unwrap();
        assert_eq!(first.tool_calls.len(), 1);

        let second = planner.plan("hello", &[], &[]).await.unwrap();
        assert!(second.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let planner = MockPlanner::new();
        planner.push_failure("connection refused");
        let err = planner.plan("take off", &[], &[]).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
