use flight_state::{FlightState, Position};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Translation direction in the drone's body frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Back => "back",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// Position delta for moving `distance_cm` in this direction.
    ///
    /// Forward is +x, right is +y, up is +z.
    pub fn unit_delta(self, distance_cm: f32) -> (f32, f32, f32) {
        match self {
            Direction::Forward => (distance_cm, 0.0, 0.0),
            Direction::Back => (-distance_cm, 0.0, 0.0),
            Direction::Left => (0.0, -distance_cm, 0.0),
            Direction::Right => (0.0, distance_cm, 0.0),
            Direction::Up => (0.0, 0.0, distance_cm),
            Direction::Down => (0.0, 0.0, -distance_cm),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Direction::Forward),
            "back" => Ok(Direction::Back),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("invalid direction: {other}")),
        }
    }
}

/// Direction for a flip maneuver (no vertical flips).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipDirection {
    Forward,
    Back,
    Left,
    Right,
}

impl FromStr for FlipDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(FlipDirection::Forward),
            "back" => Ok(FlipDirection::Back),
            "left" => Ok(FlipDirection::Left),
            "right" => Ok(FlipDirection::Right),
            other => Err(format!("invalid flip direction: {other}")),
        }
    }
}

/// A single camera frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub ts: Option<OffsetDateTime>,
}

/// Result of classifying a frame against a text description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub matched: bool,
    pub confidence: f32,
    pub label: String,
}

/// Flight envelope limits enforced by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyLimits {
    pub max_height_cm: i32,
    pub min_move_cm: u32,
    pub max_move_cm: u32,
    pub low_battery_pct: u8,
    pub flip_battery_pct: u8,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_height_cm: 200,
            min_move_cm: 20,
            max_move_cm: 100,
            low_battery_pct: 20,
            flip_battery_pct: 50,
        }
    }
}

/// Snapshot of drone and flight state for telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct DroneStatus {
    pub battery_pct: u8,
    pub height_cm: i32,
    pub state: FlightState,
    pub flying: bool,
    pub position: Position,
    pub distance_from_home_cm: f32,
}

/// Result of a rotation search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub found: bool,
    pub target: String,
    pub swept_degrees: u32,
    pub steps: u32,
    pub detection: Option<Detection>,
}

/// Result of a return-home flight.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnHomeOutcome {
    pub legs_flown: u32,
    pub fell_back_to_emergency: bool,
}
