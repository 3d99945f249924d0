use crate::{ConversationTurn, PlannerResponse, Result};
use async_trait::async_trait;
use serde_json::Value;

/// External language-model planner.
///
/// Given the raw command text, prior conversation turns, and the current
/// tool schemas, returns assistant text plus an ordered tool plan. Transport
/// and auth failures must surface as errors, never as a silently empty plan.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(
        &self,
        text: &str,
        context: &[ConversationTurn],
        tool_schemas: &[Value],
    ) -> Result<PlannerResponse>;
}
