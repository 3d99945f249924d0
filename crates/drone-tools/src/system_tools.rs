//! Telemetry and housekeeping tools.

use crate::{ParamType, Tool, ToolArgs, ToolOutcome, ToolParameter};
use abort_signal::InterruptSignal;
use async_trait::async_trait;
use drone_drivers::DroneController;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const MIN_WAIT_SECS: f64 = 0.1;
const MAX_WAIT_SECS: f64 = 10.0;

pub struct GetStatusTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for GetStatusTool {
    fn name(&self) -> &'static str {
        "get_status"
    }
    fn description(&self) -> &'static str {
        "Report battery, height, flight state, and position."
    }
    async fn execute(&self, _args: &ToolArgs) -> ToolOutcome {
        let status = self.controller.status();
        let message = format!(
            "Battery {}%, height {}cm, state {}, {:.0}cm from home.",
            status.battery_pct, status.height_cm, status.state, status.distance_from_home_cm
        );
        match serde_json::to_value(&status) {
            Ok(data) => ToolOutcome::ok_with(message, data),
            Err(e) => ToolOutcome::fail(format!("Status unavailable: {e}")),
        }
    }
}

/// Interruptible pause between maneuvers.
pub struct WaitTool {
    pub signal: InterruptSignal,
}

#[async_trait]
impl Tool for WaitTool {
    fn name(&self) -> &'static str {
        "wait"
    }
    fn description(&self) -> &'static str {
        "Pause for a number of seconds (0.1 to 10) before the next action."
    }
    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required(
            "seconds",
            ParamType::Number,
            "How long to wait, in seconds",
        )]
    }
    async fn execute(&self, args: &ToolArgs) -> ToolOutcome {
        let seconds = args
            .get("seconds")
            .and_then(Value::as_f64)
            .unwrap_or_default()
            .clamp(MIN_WAIT_SECS, MAX_WAIT_SECS);
        match self.signal.wait(seconds).await {
            Ok(()) => ToolOutcome::ok(format!("Waited {seconds:.1}s.")),
            Err(e) => ToolOutcome::fail(format!("Wait cut short: {e}")),
        }
    }
}

/// Relay a spoken-style message to the operator via the event stream.
pub struct SayTool;

#[async_trait]
impl Tool for SayTool {
    fn name(&self) -> &'static str {
        "say"
    }
    fn description(&self) -> &'static str {
        "Say something to the operator without flying anywhere."
    }
    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required(
            "message",
            ParamType::String,
            "What to say",
        )]
    }
    async fn execute(&self, args: &ToolArgs) -> ToolOutcome {
        let message = args
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        info!(message, "operator message");
        ToolOutcome::ok_with(message.clone(), json!({ "message": message }))
    }
}
