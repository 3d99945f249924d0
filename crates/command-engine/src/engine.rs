use crate::{
    CommandEvent, CommandExecution, CommandStatus, Error, EventBus, Result, SessionHistory,
    ToolExecutionRecord, ToolStatus,
};
use abort_signal::InterruptSignal;
use drone_tools::{ToolOutcome, ToolRegistry};
use flight_state::StateMachine;
use mission_planner::Planner;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};
use uuid::Uuid;

/// How many prior conversation turns (user and assistant) go back to the
/// planner as context. Ten turns is five full exchanges.
const CONTEXT_TURNS: usize = 10;

const ABORT_MESSAGE: &str = "aborted";

/// Orchestrates one natural-language command at a time: plan with the
/// language model, execute each tool in order, stream progress events, and
/// keep the session history.
///
/// Tool failures do not stop the plan; an abort does. A second command
/// arriving while one is in flight is rejected, not queued.
pub struct CommandEngine {
    planner: Arc<dyn Planner>,
    registry: Arc<ToolRegistry>,
    signal: InterruptSignal,
    events: EventBus,
    busy: AtomicBool,
    history: Mutex<SessionHistory>,
}

impl CommandEngine {
    pub fn new(
        planner: Arc<dyn Planner>,
        registry: Arc<ToolRegistry>,
        signal: InterruptSignal,
        events: EventBus,
    ) -> Self {
        Self {
            planner,
            registry,
            signal,
            events,
            busy: AtomicBool::new(false),
            history: Mutex::new(SessionHistory::new()),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Raise the abort flag out-of-band (operator panic button).
    pub fn trigger_abort(&self) {
        self.signal.set();
    }

    pub fn clear_abort(&self) {
        self.signal.clear();
    }

    pub fn is_aborted(&self) -> bool {
        self.signal.is_set()
    }

    pub fn last_execution(&self) -> Option<CommandExecution> {
        self.lock_history().last_execution().cloned()
    }

    /// Process one command end to end.
    ///
    /// Returns `Err` only for rejected commands (empty text, engine busy).
    /// Planner and tool failures come back as a completed execution with
    /// `Error` status, mirrored on the event stream.
    pub async fn submit_command(&self, text: &str) -> Result<CommandExecution> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyCommand);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let id = Uuid::new_v4();
        let mut execution = CommandExecution::new(id, text);
        info!(%id, text, "command received");
        self.events.publish(CommandEvent::CommandReceived {
            id,
            text: text.to_string(),
        });

        let context = self.lock_history().recent_turns(CONTEXT_TURNS);
        let schemas = self.registry.schemas();
        let response = match self.planner.plan(text, &context, &schemas).await {
            Ok(response) => response,
            Err(e) => {
                warn!(%id, error = %e, "planning failed");
                execution.status = CommandStatus::Error;
                self.events.publish(CommandEvent::Error {
                    id,
                    message: e.to_string(),
                });
                return Ok(self.finish(execution));
            }
        };

        execution.assistant_text = response.assistant_text.clone();
        self.events.publish(CommandEvent::AiResponse {
            id,
            text: response.assistant_text,
            tool_calls: response.tool_calls.clone(),
        });

        // The full audit trail exists from the moment the plan does; the
        // loop below only moves each record through its lifecycle.
        let total = response.tool_calls.len();
        execution.records = response
            .tool_calls
            .iter()
            .enumerate()
            .map(|(i, call)| {
                ToolExecutionRecord::pending(
                    i + 1,
                    total,
                    call.name.clone(),
                    Value::Object(call.arguments.clone()),
                )
            })
            .collect();

        let mut aborted = false;
        for idx in 0..total {
            if self.signal.is_set() {
                aborted = true;
                for record in execution.records[idx..].iter_mut() {
                    record.status = ToolStatus::Error;
                    record.message = ABORT_MESSAGE.to_string();
                    self.events.publish(CommandEvent::ToolComplete {
                        id,
                        tool: record.tool.clone(),
                        index: record.index,
                        success: false,
                        message: ABORT_MESSAGE.to_string(),
                    });
                }
                break;
            }

            let call = &response.tool_calls[idx];
            execution.records[idx].status = ToolStatus::Executing;
            self.events.publish(CommandEvent::ToolStart {
                id,
                tool: call.name.clone(),
                index: idx + 1,
                total,
            });

            let outcome = match self.registry.execute(&call.name, &call.arguments).await {
                Ok(outcome) => outcome,
                Err(e) => ToolOutcome::fail(e.to_string()),
            };

            if outcome.success {
                if let Some(data) = &outcome.data {
                    if data.get("found").and_then(Value::as_bool) == Some(true) {
                        let target = data
                            .get("target")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        execution.discovered = Some(data.clone());
                        self.events.publish(CommandEvent::Found {
                            id,
                            target,
                            data: data.clone(),
                        });
                    }
                }
            } else {
                warn!(%id, tool = %call.name, message = %outcome.message, "tool failed");
            }

            let record = &mut execution.records[idx];
            record.status = if outcome.success {
                ToolStatus::Success
            } else {
                ToolStatus::Error
            };
            record.message = outcome.message.clone();
            record.data = outcome.data;
            self.events.publish(CommandEvent::ToolComplete {
                id,
                tool: call.name.clone(),
                index: idx + 1,
                success: outcome.success,
                message: outcome.message,
            });
        }

        let (_, failed) = execution.counts();
        execution.status = if aborted || failed > 0 {
            CommandStatus::Error
        } else {
            CommandStatus::Success
        };
        Ok(self.finish(execution))
    }

    /// Publish the terminal event, record history, and hand the execution back.
    fn finish(&self, execution: CommandExecution) -> CommandExecution {
        let (succeeded, failed) = execution.counts();
        info!(
            id = %execution.id,
            status = ?execution.status,
            succeeded,
            failed,
            "command finished"
        );
        self.events.publish(CommandEvent::Done {
            id: execution.id,
            status: execution.status,
            succeeded,
            failed,
        });
        self.lock_history().record(execution.clone());
        execution
    }

    fn lock_history(&self) -> MutexGuard<'_, SessionHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Forward flight state transitions onto the event stream.
pub fn forward_state_changes(machine: &StateMachine, events: EventBus) {
    machine.on_transition(move |from, to| {
        events.publish(CommandEvent::StateChanged {
            from: from.name().to_string(),
            to: to.name().to_string(),
        });
    });
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use drone_drivers::{
        DroneController, MockMotion, MockVision, SafetyLimits,
    };
    use drone_tools::register_default_tools;
    use flight_state::FlightState;
    use mission_planner::{
        ConversationTurn, MockPlanner, PlannerResponse, ToolCall,
    };
    use std::time::Duration;
    use tokio::sync::broadcast;

    struct Rig {
        engine: CommandEngine,
        controller: Arc<DroneController>,
        signal: InterruptSignal,
    }

    fn rig(planner: MockPlanner, vision: MockVision) -> Rig {
        let signal = InterruptSignal::new();
        let controller = Arc::new(
            DroneController::new(
                Box::new(MockMotion::new()),
                Box::new(vision),
                signal.clone(),
                SafetyLimits::default(),
            )
            .with_search_pause(0.01),
        );
        let mut registry = drone_tools::ToolRegistry::new();
        register_default_tools(&mut registry, controller.clone(), signal.clone())
            .expect("default tools");
        let events = EventBus::new();
        forward_state_changes(controller.state_machine(), events.clone());
        let engine = CommandEngine::new(
            Arc::new(planner),
            Arc::new(registry),
            signal.clone(),
            events,
        );
        Rig {
            engine,
            controller,
            signal,
        }
    }

    fn drain(rx: &mut broadcast::Receiver<Arc<CommandEvent>>) -> Vec<Arc<CommandEvent>> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn event_names(events: &[Arc<CommandEvent>]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match &**e {
                CommandEvent::CommandReceived { .. } => "command_received",
                CommandEvent::AiResponse { .. } => "ai_response",
                CommandEvent::ToolStart { .. } => "tool_start",
                CommandEvent::ToolComplete { .. } => "tool_complete",
                CommandEvent::Found { .. } => "found",
                CommandEvent::StateChanged { .. } => "state_changed",
                CommandEvent::Error { .. } => "error",
                CommandEvent::Done { .. } => "done",
            })
            .collect()
    }

    #[tokio::test]
    async fn test_simple_mission_runs_every_tool() {
        let planner = MockPlanner::with_responses(vec![PlannerResponse::with_calls(
            "Flying a short square leg.",
            vec![
                ToolCall::new("takeoff"),
                ToolCall::new("move")
                    .with_arg("direction", "forward")
                    .with_arg("distance", 50),
                ToolCall::new("rotate").with_arg("degrees", 90),
                ToolCall::new("land"),
            ],
        )]);
        let rig = rig(planner, MockVision::never());

        let execution = rig
            .engine
            .submit_command("fly forward a bit, turn, and land")
            .await
            .unwrap();

        assert_eq!(execution.status, CommandStatus::Success);
        assert_eq!(execution.records.len(), 4);
        assert!(execution.records.iter().all(|r| r.status == ToolStatus::Success));
        assert_eq!(execution.counts(), (4, 0));
        assert_eq!(
            rig.controller.state_machine().state(),
            FlightState::Grounded
        );
    }

    #[tokio::test]
    async fn test_ai_response_event_lists_planned_calls() {
        let planner = MockPlanner::with_responses(vec![PlannerResponse::with_calls(
            "Up and forward.",
            vec![
                ToolCall::new("takeoff"),
                ToolCall::new("move")
                    .with_arg("direction", "forward")
                    .with_arg("distance", 40),
            ],
        )]);
        let rig = rig(planner, MockVision::never());
        let mut rx = rig.engine.events().subscribe();

        rig.engine.submit_command("go forward").await.unwrap();

        let plan = drain(&mut rx)
            .iter()
            .find_map(|e| match &**e {
                CommandEvent::AiResponse { tool_calls, .. } => Some(tool_calls.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].name, "takeoff");
        assert_eq!(plan[1].name, "move");
        assert_eq!(plan[1].arguments["direction"], "forward");
    }

    #[tokio::test]
    async fn test_illegal_tool_fails_but_plan_continues() {
        // Already airborne: the planned takeoff fails, the status query
        // after it still runs.
        let planner = MockPlanner::with_responses(vec![PlannerResponse::with_calls(
            "Taking off and checking in.",
            vec![ToolCall::new("takeoff"), ToolCall::new("get_status")],
        )]);
        let rig = rig(planner, MockVision::never());
        rig.controller.takeoff().unwrap();

        let execution = rig.engine.submit_command("take off").await.unwrap();

        assert_eq!(execution.status, CommandStatus::Error);
        assert_eq!(execution.records[0].status, ToolStatus::Error);
        assert_eq!(execution.records[1].status, ToolStatus::Success);
        // The failed takeoff left the flight state alone.
        assert_eq!(
            rig.controller.state_machine().state(),
            FlightState::Hovering
        );
    }

    #[tokio::test]
    async fn test_emergency_stop_skips_remaining_tools() {
        let planner = MockPlanner::with_responses(vec![PlannerResponse::with_calls(
            "Stopping everything.",
            vec![
                ToolCall::new("takeoff"),
                ToolCall::new("emergency_stop"),
                ToolCall::new("move")
                    .with_arg("direction", "forward")
                    .with_arg("distance", 80),
                ToolCall::new("rotate").with_arg("degrees", 180),
            ],
        )]);
        let rig = rig(planner, MockVision::never());
        let mut rx = rig.engine.events().subscribe();

        let execution = rig.engine.submit_command("take off then stop").await.unwrap();

        assert_eq!(execution.status, CommandStatus::Error);
        assert_eq!(execution.records[0].status, ToolStatus::Success);
        assert_eq!(execution.records[1].status, ToolStatus::Success);
        assert_eq!(execution.records[2].status, ToolStatus::Error);
        assert_eq!(execution.records[2].message, "aborted");
        assert_eq!(execution.records[3].status, ToolStatus::Error);
        assert!(rig.engine.is_aborted());
        assert_eq!(rig.controller.state_machine().state(), FlightState::Aborted);
        // Nothing moved after the stop.
        assert!(rig.controller.state_machine().position().distance_from_home() < 1e-4);

        // Abort path: skipped tool_completes straight into done, no error
        // event in between.
        let names: Vec<&str> = event_names(&drain(&mut rx))
            .into_iter()
            .filter(|n| *n != "state_changed")
            .collect();
        assert_eq!(
            names,
            vec![
                "command_received",
                "ai_response",
                "tool_start",
                "tool_complete",
                "tool_start",
                "tool_complete",
                "tool_complete",
                "tool_complete",
                "done",
            ]
        );
    }

    #[tokio::test]
    async fn test_search_streams_found_event_in_order() {
        let planner = MockPlanner::with_responses(vec![PlannerResponse::with_calls(
            "Scanning for the backpack.",
            vec![
                ToolCall::new("takeoff"),
                ToolCall::new("search").with_arg("target", "red backpack"),
            ],
        )]);
        let rig = rig(planner, MockVision::match_on_capture(3));
        let mut rx = rig.engine.events().subscribe();

        let execution = rig
            .engine
            .submit_command("find the red backpack")
            .await
            .unwrap();

        assert_eq!(execution.status, CommandStatus::Success);
        let discovered = execution.discovered.unwrap();
        assert_eq!(discovered["swept_degrees"], 135);
        assert!(
            (rig.controller.state_machine().position().heading - 135.0).abs() < 1e-4
        );

        let events = drain(&mut rx);
        let names: Vec<&str> = event_names(&events)
            .into_iter()
            .filter(|n| *n != "state_changed")
            .collect();
        assert_eq!(
            names,
            vec![
                "command_received",
                "ai_response",
                "tool_start",
                "tool_complete",
                "tool_start",
                "found",
                "tool_complete",
                "done",
            ]
        );
    }

    #[tokio::test]
    async fn test_planner_failure_reports_error() {
        let planner = MockPlanner::new();
        planner.push_failure("connection refused");
        let rig = rig(planner, MockVision::never());
        let mut rx = rig.engine.events().subscribe();

        let execution = rig.engine.submit_command("take off").await.unwrap();

        assert_eq!(execution.status, CommandStatus::Error);
        assert!(execution.records.is_empty());
        assert_eq!(
            event_names(&drain(&mut rx)),
            vec!["command_received", "error", "done"]
        );
        // The vehicle never moved.
        assert_eq!(
            rig.controller.state_machine().state(),
            FlightState::Grounded
        );
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let rig = rig(MockPlanner::new(), MockVision::never());
        assert!(matches!(
            rig.engine.submit_command("   ").await,
            Err(Error::EmptyCommand)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_second_command_rejected_while_busy() {
        struct SlowPlanner;

        #[async_trait]
        impl Planner for SlowPlanner {
            async fn plan(
                &self,
                _text: &str,
                _context: &[ConversationTurn],
                _tools: &[serde_json::Value],
            ) -> mission_planner::Result<PlannerResponse> {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(PlannerResponse::text("done thinking"))
            }
        }

        let signal = InterruptSignal::new();
        let controller = Arc::new(DroneController::new(
            Box::new(MockMotion::new()),
            Box::new(MockVision::never()),
            signal.clone(),
            SafetyLimits::default(),
        ));
        let mut registry = drone_tools::ToolRegistry::new();
        register_default_tools(&mut registry, controller, signal.clone())
            .expect("default tools");
        let engine = Arc::new(CommandEngine::new(
            Arc::new(SlowPlanner),
            Arc::new(registry),
            signal,
            EventBus::new(),
        ));

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.submit_command("think hard").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(matches!(
            engine.submit_command("me too").await,
            Err(Error::Busy)
        ));
        assert!(first.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_abort_persists_until_explicitly_cleared() {
        // The engine never clears the flag on its own; a stale abort skips
        // every tool of the next command too.
        let planner = MockPlanner::with_responses(vec![
            PlannerResponse::with_calls("Going up.", vec![ToolCall::new("takeoff")]),
            PlannerResponse::with_calls("Going up.", vec![ToolCall::new("takeoff")]),
        ]);
        let rig = rig(planner, MockVision::never());

        rig.signal.set();
        let first = rig.engine.submit_command("take off").await.unwrap();
        assert_eq!(first.status, CommandStatus::Error);
        assert_eq!(first.records[0].message, "aborted");
        assert!(rig.signal.is_set());

        rig.engine.clear_abort();
        let second = rig.engine.submit_command("take off").await.unwrap();
        assert_eq!(second.status, CommandStatus::Success);
    }

    #[tokio::test]
    async fn test_unknown_tool_recorded_as_failure() {
        let planner = MockPlanner::with_responses(vec![PlannerResponse::with_calls(
            "Trying something exotic.",
            vec![ToolCall::new("teleport")],
        )]);
        let rig = rig(planner, MockVision::never());

        let execution = rig.engine.submit_command("teleport home").await.unwrap();
        assert_eq!(execution.status, CommandStatus::Error);
        assert!(execution.records[0].message.contains("unknown tool"));
    }

    #[tokio::test]
    async fn test_history_feeds_back_as_context() {
        let planner = MockPlanner::with_responses(vec![
            PlannerResponse::text("Hello!"),
            PlannerResponse::text("Hello again!"),
        ]);
        let rig = rig(planner, MockVision::never());

        rig.engine.submit_command("hi").await.unwrap();
        rig.engine.submit_command("hi again").await.unwrap();

        let last = rig.engine.last_execution().unwrap();
        assert_eq!(last.assistant_text, "Hello again!");
        assert_eq!(last.status, CommandStatus::Success);
    }
}
