//! Emergency and recovery maneuvers.

use crate::{Tool, ToolArgs, ToolOutcome};
use async_trait::async_trait;
use drone_drivers::DroneController;
use serde_json::json;
use std::sync::Arc;

/// Raise the abort flag and hold position. Remaining tools in the current
/// plan are skipped once this runs.
pub struct EmergencyStopTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for EmergencyStopTool {
    fn name(&self) -> &'static str {
        "emergency_stop"
    }
    fn description(&self) -> &'static str {
        "Immediately stop all movement and hold position. Cancels the rest \
         of the current command."
    }
    async fn execute(&self, _args: &ToolArgs) -> ToolOutcome {
        self.controller.emergency_stop();
        ToolOutcome::ok("Emergency stop: holding position.")
    }
}

/// Land right now, regardless of flight state.
pub struct EmergencyLandTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for EmergencyLandTool {
    fn name(&self) -> &'static str {
        "emergency_land"
    }
    fn description(&self) -> &'static str {
        "Land immediately at the current location, bypassing normal checks."
    }
    async fn execute(&self, _args: &ToolArgs) -> ToolOutcome {
        match self.controller.emergency_land() {
            Ok(()) => ToolOutcome::ok("Emergency landing complete."),
            Err(e) => ToolOutcome::fail(format!("Emergency landing failed: {e}")),
        }
    }
}

/// Fly back to the takeoff point and land there.
pub struct ReturnHomeTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for ReturnHomeTool {
    fn name(&self) -> &'static str {
        "return_home"
    }
    fn description(&self) -> &'static str {
        "Fly back to the takeoff point and land. Falls back to an emergency \
         landing if the return flight fails."
    }
    async fn execute(&self, _args: &ToolArgs) -> ToolOutcome {
        match self.controller.return_home().await {
            Ok(outcome) if outcome.fell_back_to_emergency => ToolOutcome::fail(format!(
                "Return flight failed after {} legs; landed on the spot instead.",
                outcome.legs_flown
            )),
            Ok(outcome) => ToolOutcome::ok_with(
                "Returned home and landed.",
                json!({ "legs_flown": outcome.legs_flown }),
            ),
            Err(e) => ToolOutcome::fail(format!("Return home failed: {e}")),
        }
    }
}
