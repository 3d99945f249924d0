//! Basic flight maneuvers: takeoff, land, move, rotate, flip, hover.

use crate::{ParamType, Tool, ToolArgs, ToolOutcome, ToolParameter};
use async_trait::async_trait;
use drone_drivers::{Direction, DroneController, FlipDirection};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct TakeoffTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for TakeoffTool {
    fn name(&self) -> &'static str {
        "takeoff"
    }
    fn description(&self) -> &'static str {
        "Take off and hover in place. The drone must be on the ground."
    }
    async fn execute(&self, _args: &ToolArgs) -> ToolOutcome {
        match self.controller.takeoff() {
            Ok(()) => ToolOutcome::ok("Takeoff complete, hovering."),
            Err(e) => ToolOutcome::fail(format!("Takeoff failed: {e}")),
        }
    }
}

pub struct LandTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for LandTool {
    fn name(&self) -> &'static str {
        "land"
    }
    fn description(&self) -> &'static str {
        "Land at the current location. The drone must be flying."
    }
    async fn execute(&self, _args: &ToolArgs) -> ToolOutcome {
        match self.controller.land() {
            Ok(()) => ToolOutcome::ok("Landed."),
            Err(e) => ToolOutcome::fail(format!("Landing failed: {e}")),
        }
    }
}

pub struct MoveTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for MoveTool {
    fn name(&self) -> &'static str {
        "move"
    }
    fn description(&self) -> &'static str {
        "Move in a body-frame direction. Distance is in centimeters and is \
         clamped to the safe envelope (20-100cm)."
    }
    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required(
                "direction",
                ParamType::String,
                "One of: forward, back, left, right, up, down",
            ),
            ToolParameter::required("distance", ParamType::Integer, "Distance in centimeters"),
        ]
    }
    async fn execute(&self, args: &ToolArgs) -> ToolOutcome {
        let direction: Direction = match parse_enum(args, "direction") {
            Ok(d) => d,
            Err(outcome) => return outcome,
        };
        let requested = args
            .get("distance")
            .and_then(Value::as_i64)
            .unwrap_or_default()
            .max(0) as u32;
        match self.controller.translate(direction, requested) {
            Ok(flown) => ToolOutcome::ok_with(
                format!("Moved {} {flown}cm.", direction.as_str()),
                json!({
                    "direction": direction.as_str(),
                    "requested_cm": requested,
                    "flown_cm": flown,
                }),
            ),
            Err(e) => ToolOutcome::fail(format!("Move failed: {e}")),
        }
    }
}

pub struct RotateTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for RotateTool {
    fn name(&self) -> &'static str {
        "rotate"
    }
    fn description(&self) -> &'static str {
        "Rotate in place. Positive degrees turn clockwise, negative turn \
         counter-clockwise."
    }
    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required(
            "degrees",
            ParamType::Integer,
            "Rotation angle in degrees",
        )]
    }
    async fn execute(&self, args: &ToolArgs) -> ToolOutcome {
        let degrees = args
            .get("degrees")
            .and_then(Value::as_i64)
            .unwrap_or_default() as i32;
        match self.controller.rotate(degrees) {
            Ok(()) => ToolOutcome::ok(format!("Rotated {degrees} degrees.")),
            Err(e) => ToolOutcome::fail(format!("Rotation failed: {e}")),
        }
    }
}

pub struct FlipTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for FlipTool {
    fn name(&self) -> &'static str {
        "flip"
    }
    fn description(&self) -> &'static str {
        "Perform an aerial flip. Needs at least 50% battery."
    }
    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required(
            "direction",
            ParamType::String,
            "One of: forward, back, left, right",
        )]
    }
    async fn execute(&self, args: &ToolArgs) -> ToolOutcome {
        let direction: FlipDirection = match parse_enum(args, "direction") {
            Ok(d) => d,
            Err(outcome) => return outcome,
        };
        match self.controller.flip(direction) {
            Ok(()) => ToolOutcome::ok("Flip complete."),
            Err(e) => ToolOutcome::fail(format!("Flip failed: {e}")),
        }
    }
}

pub struct HoverTool {
    pub controller: Arc<DroneController>,
}

#[async_trait]
impl Tool for HoverTool {
    fn name(&self) -> &'static str {
        "hover"
    }
    fn description(&self) -> &'static str {
        "Stop moving and hover in place. Also resumes flight after an abort."
    }
    async fn execute(&self, _args: &ToolArgs) -> ToolOutcome {
        match self.controller.hover() {
            Ok(()) => ToolOutcome::ok("Hovering."),
            Err(e) => ToolOutcome::fail(format!("Hover failed: {e}")),
        }
    }
}

/// Parse a string argument through its `FromStr` impl, turning a bad value
/// into a failed outcome with the parser's own message.
fn parse_enum<T>(args: &ToolArgs, key: &str) -> Result<T, ToolOutcome>
where
    T: std::str::FromStr<Err = String>,
{
    args.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .parse()
        .map_err(ToolOutcome::fail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use abort_signal::InterruptSignal;
    use drone_drivers::{MockMotion, MockVision, SafetyLimits};
    use flight_state::FlightState;

    fn controller() -> Arc<DroneController> {
        Arc::new(DroneController::new(
            Box::new(MockMotion::new()),
            Box::new(MockVision::never()),
            InterruptSignal::new(),
            SafetyLimits::default(),
        ))
    }

    #[tokio::test]
    async fn test_takeoff_then_move() {
        let ctl = controller();
        let takeoff = TakeoffTool {
            controller: ctl.clone(),
        };
        let mv = MoveTool {
            controller: ctl.clone(),
        };

        assert!(takeoff.execute(&ToolArgs::new()).await.success);

        let mut args = ToolArgs::new();
        args.insert("direction".into(), json!("forward"));
        args.insert("distance".into(), json!(250));
        let outcome = mv.execute(&args).await;
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data["flown_cm"], 100); // clamped
        assert_eq!(ctl.state_machine().state(), FlightState::Hovering);
    }

    #[tokio::test]
    async fn test_move_invalid_direction() {
        let ctl = controller();
        ctl.takeoff().unwrap();
        let mv = MoveTool { controller: ctl };

        let mut args = ToolArgs::new();
        args.insert("direction".into(), json!("sideways"));
        args.insert("distance".into(), json!(50));
        let outcome = mv.execute(&args).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("sideways"));
    }

    #[tokio::test]
    async fn test_land_while_grounded_fails() {
        let land = LandTool {
            controller: controller(),
        };
        let outcome = land.execute(&ToolArgs::new()).await;
        assert!(!outcome.success);
    }
}
