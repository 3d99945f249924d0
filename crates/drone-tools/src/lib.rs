//! drone-tools: Planner-invocable tool surface
//!
//! Every drone capability the language model may call is a [`Tool`]: a named,
//! parameter-declared unit registered in a [`ToolRegistry`]. The registry
//! generates the function-calling schemas the planner sees and validates the
//! planner's arguments before anything moves.

mod error;
pub use error::{Error, Result};

mod outcome;
pub use outcome::ToolOutcome;

mod registry;
pub use registry::{ParamType, Tool, ToolArgs, ToolParameter, ToolRegistry};

mod drone_tools;
pub use drone_tools::{FlipTool, HoverTool, LandTool, MoveTool, RotateTool, TakeoffTool};

mod vision_tools;
pub use vision_tools::SearchTool;

mod safety_tools;
pub use safety_tools::{EmergencyLandTool, EmergencyStopTool, ReturnHomeTool};

mod system_tools;
pub use system_tools::{GetStatusTool, SayTool, WaitTool};

use abort_signal::InterruptSignal;
use drone_drivers::DroneController;
use std::sync::Arc;

/// Register the full standard tool set against one controller.
pub fn register_default_tools(
    registry: &mut ToolRegistry,
    controller: Arc<DroneController>,
    signal: InterruptSignal,
) -> Result<()> {
    registry.register(Arc::new(TakeoffTool {
        controller: controller.clone(),
    }))?;
    registry.register(Arc::new(LandTool {
        controller: controller.clone(),
    }))?;
    registry.register(Arc::new(MoveTool {
        controller: controller.clone(),
    }))?;
    registry.register(Arc::new(RotateTool {
        controller: controller.clone(),
    }))?;
    registry.register(Arc::new(FlipTool {
        controller: controller.clone(),
    }))?;
    registry.register(Arc::new(HoverTool {
        controller: controller.clone(),
    }))?;
    registry.register(Arc::new(SearchTool {
        controller: controller.clone(),
    }))?;
    registry.register(Arc::new(EmergencyStopTool {
        controller: controller.clone(),
    }))?;
    registry.register(Arc::new(EmergencyLandTool {
        controller: controller.clone(),
    }))?;
    registry.register(Arc::new(ReturnHomeTool {
        controller: controller.clone(),
    }))?;
    registry.register(Arc::new(GetStatusTool { controller }))?;
    registry.register(Arc::new(WaitTool { signal }))?;
    registry.register(Arc::new(SayTool))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drone_drivers::{MockMotion, MockVision, SafetyLimits};

    #[test]
    fn test_default_tool_set() {
        let signal = InterruptSignal::new();
        let controller = Arc::new(DroneController::new(
            Box::new(MockMotion::new()),
            Box::new(MockVision::never()),
            signal.clone(),
            SafetyLimits::default(),
        ));
        let mut registry = ToolRegistry::new();
        register_default_tools(&mut registry, controller, signal).unwrap();

        assert_eq!(registry.len(), 13);
        assert!(registry.names().contains(&"takeoff"));
        assert!(registry.names().contains(&"emergency_stop"));
        assert_eq!(registry.schemas().len(), 13);
    }
}
