use mission_planner::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::CommandStatus;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Progress events streamed while a command is processed.
///
/// Tagged for the wire so front ends can dispatch on `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CommandEvent {
    /// A command was accepted and processing has begun.
    CommandReceived { id: Uuid, text: String },
    /// The planner answered. Carries the full ordered plan so listeners can
    /// render per-tool progress without polling.
    AiResponse {
        id: Uuid,
        text: String,
        tool_calls: Vec<ToolCall>,
    },
    /// Tool `index` of `total` is about to run. 1-based.
    ToolStart {
        id: Uuid,
        tool: String,
        index: usize,
        total: usize,
    },
    /// Tool `index` finished (or was skipped by an abort).
    ToolComplete {
        id: Uuid,
        tool: String,
        index: usize,
        success: bool,
        message: String,
    },
    /// A search located its target.
    Found {
        id: Uuid,
        target: String,
        data: Value,
    },
    /// The flight state machine changed state.
    StateChanged { from: String, to: String },
    /// Command-level failure (planner error, abort).
    Error { id: Uuid, message: String },
    /// Terminal event for one command; exactly one is sent per command.
    Done {
        id: Uuid,
        status: CommandStatus,
        succeeded: usize,
        failed: usize,
    },
}

/// Broadcast fan-out for [`CommandEvent`]s.
///
/// Publishing is best-effort: with no subscribers, or with a lagged
/// subscriber, events are dropped rather than blocking command processing.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<CommandEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<CommandEvent>> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: CommandEvent) {
        trace!(?event, "publishing event");
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_all_subscribers() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        let id = Uuid::new_v4();
        bus.publish(CommandEvent::CommandReceived {
            id,
            text: "take off".into(),
        });

        for rx in [&mut a, &mut b] {
            let event = rx.recv().await.unwrap();
            assert!(matches!(&*event, CommandEvent::CommandReceived { text, .. } if text == "take off"));
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(CommandEvent::StateChanged {
            from: "grounded".into(),
            to: "taking_off".into(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_ai_response_carries_full_plan() {
        let event = CommandEvent::AiResponse {
            id: Uuid::nil(),
            text: "Moving out.".into(),
            tool_calls: vec![
                ToolCall::new("takeoff"),
                ToolCall::new("move")
                    .with_arg("direction", "forward")
                    .with_arg("distance", 50),
            ],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "ai_response");
        assert_eq!(json["tool_calls"][0]["name"], "takeoff");
        assert_eq!(json["tool_calls"][1]["name"], "move");
        assert_eq!(json["tool_calls"][1]["arguments"]["distance"], 50);
    }

    #[test]
    fn test_wire_format() {
        let event = CommandEvent::ToolStart {
            id: Uuid::nil(),
            tool: "takeoff".into(),
            index: 1,
            total: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "tool_start");
        assert_eq!(json["index"], 1);
        assert_eq!(json["total"], 3);
    }
}
