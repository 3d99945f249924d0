//! Camera-driven search.

use crate::{ParamType, Tool, ToolArgs, ToolOutcome, ToolParameter};
use async_trait::async_trait;
use drone_drivers::{DroneController, Error as DriverError};
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_ROTATION_STEP: u32 = 45;

/// Rotate in place, scanning for a described object after each step.
pub struct SearchTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &'static str {
        "search"
    }
    fn description(&self) -> &'static str {
        "Rotate in increments and scan the camera for a described object, \
         stopping as soon as it is found."
    }
    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required(
                "target",
                ParamType::String,
                "Description of the object to look for",
            ),
            ToolParameter::optional(
                "rotation_step",
                ParamType::Integer,
                "Degrees to rotate between scans (default 45)",
            ),
        ]
    }
    async fn execute(&self, args: &ToolArgs) -> ToolOutcome {
        let target = args
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let step = args
            .get("rotation_step")
            .and_then(Value::as_u64)
            .map(|v| v as u32)
            .unwrap_or(DEFAULT_ROTATION_STEP);

        match self.controller.search(target, step).await {
            Ok(outcome) if outcome.found => {
                let confidence = outcome
                    .detection
                    .as_ref()
                    .map(|d| d.confidence)
                    .unwrap_or_default();
                ToolOutcome::ok_with(
                    format!(
                        "Found {target} after sweeping {} degrees.",
                        outcome.swept_degrees
                    ),
                    json!({
                        "found": true,
                        "target": target,
                        "swept_degrees": outcome.swept_degrees,
                        "steps": outcome.steps,
                        "confidence": confidence,
                    }),
                )
            }
            // A full revolution with nothing spotted is a failed search.
            Ok(outcome) => ToolOutcome::fail_with(
                format!("Could not find {target} after searching 360 degrees."),
                json!({
                    "found": false,
                    "target": target,
                    "swept_degrees": outcome.swept_degrees,
                    "steps": outcome.steps,
                }),
            ),
            Err(DriverError::Interrupted(_)) => {
                ToolOutcome::fail(format!("Search for {target} aborted."))
            }
            Err(e) => ToolOutcome::fail(format!("Search failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abort_signal::InterruptSignal;
    use drone_drivers::{MockMotion, MockVision, SafetyLimits};

    fn search_tool(vision: MockVision) -> SearchTool {
        let controller = Arc::new(
            DroneController::new(
                Box::new(MockMotion::new()),
                Box::new(vision),
                InterruptSignal::new(),
                SafetyLimits::default(),
            )
            .with_search_pause(0.01),
        );
        controller.takeoff().unwrap();
        SearchTool { controller }
    }

    #[tokio::test]
    async fn test_search_reports_found() {
        let tool = search_tool(MockVision::match_on_capture(2));
        let mut args = ToolArgs::new();
        args.insert("target".into(), json!("red backpack"));
        let outcome = tool.execute(&args).await;
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data["found"], true);
        assert_eq!(data["swept_degrees"], 90);
    }

    #[tokio::test]
    async fn test_search_no_match_is_failure() {
        let tool = search_tool(MockVision::never());
        let mut args = ToolArgs::new();
        args.insert("target".into(), json!("green tent"));
        args.insert("rotation_step".into(), json!(90));
        let outcome = tool.execute(&args).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("Could not find"));
        let data = outcome.data.unwrap();
        assert_eq!(data["found"], false);
        assert_eq!(data["steps"], 4);
    }

    #[tokio::test]
    async fn test_search_interrupt_reports_aborted() {
        let signal = InterruptSignal::new();
        let controller = Arc::new(
            DroneController::new(
                Box::new(MockMotion::new()),
                Box::new(MockVision::never()),
                signal.clone(),
                SafetyLimits::default(),
            )
            .with_search_pause(0.01),
        );
        controller.takeoff().unwrap();
        let tool = SearchTool { controller };

        signal.set();
        let mut args = ToolArgs::new();
        args.insert("target".into(), json!("red backpack"));
        let outcome = tool.execute(&args).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("aborted"));
        assert!(!outcome.message.contains("failed"));
    }
}
