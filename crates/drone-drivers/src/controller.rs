use crate::{
    Direction, DroneStatus, Error, FlipDirection, MotionDriver, Result, ReturnHomeOutcome,
    SafetyLimits, SearchOutcome, VisionDriver,
};
use abort_signal::InterruptSignal;
use flight_state::{FlightState, MotionDelta, StateMachine};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

const DEFAULT_SEARCH_PAUSE_SECS: f64 = 0.5;
const MIN_ROTATION_STEP: u32 = 15;
const MAX_ROTATION_STEP: u32 = 120;

/// High-level drone control bound to the flight state machine.
///
/// Every physical action goes through here: the controller checks legality
/// against the state machine, drives the motion/vision drivers, and keeps
/// the position estimate current. Multi-step maneuvers (search, return home)
/// poll the abort signal between physical steps.
pub struct DroneController {
    motion: Mutex<Box<dyn MotionDriver>>,
    vision: Mutex<Box<dyn VisionDriver>>,
    state: Arc<StateMachine>,
    signal: InterruptSignal,
    limits: SafetyLimits,
    search_pause_secs: f64,
}

impl DroneController {
    pub fn new(
        motion: Box<dyn MotionDriver>,
        vision: Box<dyn VisionDriver>,
        signal: InterruptSignal,
        limits: SafetyLimits,
    ) -> Self {
        Self {
            motion: Mutex::new(motion),
            vision: Mutex::new(vision),
            state: Arc::new(StateMachine::new()),
            signal,
            limits,
            search_pause_secs: DEFAULT_SEARCH_PAUSE_SECS,
        }
    }

    /// Override the pause between search rotation steps.
    pub fn with_search_pause(mut self, seconds: f64) -> Self {
        self.search_pause_secs = seconds;
        self
    }

    pub fn state_machine(&self) -> &Arc<StateMachine> {
        &self.state
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Take off and hover at the default altitude.
    ///
    /// Requires a grounded vehicle and battery above the low floor; resets
    /// the home origin via the `Grounded -> TakingOff` transition.
    pub fn takeoff(&self) -> Result<()> {
        if self.state.is_flying() {
            return Err(Error::AlreadyFlying);
        }
        let battery = self.lock_motion().battery_pct();
        if battery < self.limits.low_battery_pct {
            return Err(Error::BatteryLow {
                pct: battery,
                floor: self.limits.low_battery_pct,
            });
        }
        self.state.request_transition(FlightState::TakingOff)?;
        if let Err(e) = self.lock_motion().takeoff() {
            let _ = self.state.request_transition(FlightState::Error);
            return Err(e);
        }
        self.state.request_transition(FlightState::Hovering)?;
        info!("airborne");
        Ok(())
    }

    /// Land at the current location.
    pub fn land(&self) -> Result<()> {
        if !self.state.is_flying() {
            return Err(Error::NotFlying);
        }
        self.state.request_transition(FlightState::Landing)?;
        if let Err(e) = self.lock_motion().land() {
            let _ = self.state.request_transition(FlightState::Error);
            return Err(e);
        }
        self.state.request_transition(FlightState::Grounded)?;
        info!("landed");
        Ok(())
    }

    /// Move in `direction`, clamping the distance to the configured envelope.
    ///
    /// Returns the distance actually flown.
    pub fn translate(&self, direction: Direction, distance_cm: u32) -> Result<u32> {
        let clamped = distance_cm.clamp(self.limits.min_move_cm, self.limits.max_move_cm);
        self.fly_leg(direction, clamped)?;
        Ok(clamped)
    }

    /// Rotate by `degrees` (positive = clockwise). Always legal while flying.
    pub fn rotate(&self, degrees: i32) -> Result<()> {
        self.state.request_transition(FlightState::Flying)?;
        let rotated = self.lock_motion().rotate(degrees);
        if let Err(e) = rotated {
            let _ = self.recover_to_hover();
            return Err(e);
        }
        self.state.record_motion(MotionDelta::rotation(degrees as f32))?;
        self.state.request_transition(FlightState::Hovering)?;
        Ok(())
    }

    /// Momentary attitude change; position is unchanged.
    pub fn flip(&self, direction: FlipDirection) -> Result<()> {
        let battery = self.lock_motion().battery_pct();
        if battery < self.limits.flip_battery_pct {
            return Err(Error::BatteryLow {
                pct: battery,
                floor: self.limits.flip_battery_pct,
            });
        }
        self.state.request_transition(FlightState::Flying)?;
        let flipped = self.lock_motion().flip(direction);
        if let Err(e) = flipped {
            let _ = self.recover_to_hover();
            return Err(e);
        }
        self.state.request_transition(FlightState::Hovering)?;
        Ok(())
    }

    /// Cancel residual motion and hover in place.
    pub fn hover(&self) -> Result<()> {
        if !self.state.is_flying() && self.state.state() != FlightState::Aborted {
            return Err(Error::NotFlying);
        }
        self.lock_motion().hover()?;
        if matches!(
            self.state.state(),
            FlightState::Flying | FlightState::Aborted
        ) {
            self.state.request_transition(FlightState::Hovering)?;
        }
        Ok(())
    }

    /// Halt all movement: raises the abort flag, stops the vehicle, and
    /// parks the state machine in `Aborted` until an operator resumes.
    pub fn emergency_stop(&self) {
        warn!("emergency stop activated");
        self.signal.set();
        if self.lock_motion().hover().is_err() {
            warn!("hover command failed during emergency stop");
        }
        if matches!(
            self.state.state(),
            FlightState::Hovering | FlightState::Flying
        ) {
            let _ = self.state.request_transition(FlightState::Aborted);
        }
    }

    /// Land immediately, bypassing all preconditions.
    pub fn emergency_land(&self) -> Result<()> {
        warn!("emergency land initiated");
        self.signal.set();
        self.state.force_transition(FlightState::Landing);
        match self.lock_motion().land() {
            Ok(()) => {
                self.state.force_transition(FlightState::Grounded);
                info!("emergency landing complete");
                Ok(())
            }
            Err(e) => {
                self.state.force_transition(FlightState::Error);
                Err(e)
            }
        }
    }

    /// Resume hovering after an abort (`Aborted -> Hovering`).
    pub fn resume_hover(&self) -> Result<()> {
        self.state.request_transition(FlightState::Hovering)?;
        self.lock_motion().hover()
    }

    /// Reset a faulted vehicle back to grounded (`Error -> Grounded`).
    pub fn reset_error(&self) -> Result<()> {
        self.state.request_transition(FlightState::Grounded)?;
        Ok(())
    }

    /// Rotate in fixed increments, classifying a frame after each step.
    ///
    /// Stops early on the first match, reporting the total angle swept.
    /// A full revolution with no match is a completed-but-unsuccessful
    /// search; an abort mid-search surfaces as `Interrupted`.
    pub async fn search(&self, target: &str, rotation_step: u32) -> Result<SearchOutcome> {
        if !self.state.is_flying() {
            return Err(Error::NotFlying);
        }
        let step = rotation_step.clamp(MIN_ROTATION_STEP, MAX_ROTATION_STEP);
        let increments = 360_u32.div_ceil(step);
        info!(target, step, increments, "starting rotation search");

        for i in 1..=increments {
            if self.signal.is_set() {
                return Err(abort_signal::Interrupted.into());
            }
            self.rotate(step as i32)?;
            let detection = {
                let mut vision = self.lock_vision();
                let frame = vision.capture()?;
                vision.classify(&frame, target)?
            };
            if detection.matched {
                info!(target, swept = i * step, "search target found");
                return Ok(SearchOutcome {
                    found: true,
                    target: target.to_string(),
                    swept_degrees: i * step,
                    steps: i,
                    detection: Some(detection),
                });
            }
            if i < increments {
                self.signal.wait(self.search_pause_secs).await?;
            }
        }

        info!(target, "search completed without a match");
        Ok(SearchOutcome {
            found: false,
            target: target.to_string(),
            swept_degrees: increments * step,
            steps: increments,
            detection: None,
        })
    }

    /// Fly back to the takeoff point in compensating legs, then land.
    ///
    /// Altitude is corrected first, then x, then y. A failed leg falls back
    /// to an emergency landing on the spot.
    pub async fn return_home(&self) -> Result<ReturnHomeOutcome> {
        if !self.state.is_flying() {
            return Err(Error::NotFlying);
        }
        let position = self.state.position();
        let legs = plan_return_legs(
            position.x,
            position.y,
            position.z,
            self.limits.max_move_cm,
        );
        info!(
            distance_cm = position.distance_from_home(),
            legs = legs.len(),
            "returning home"
        );

        let mut flown = 0u32;
        for (direction, cm) in legs {
            if self.signal.is_set() {
                return Err(abort_signal::Interrupted.into());
            }
            if let Err(e) = self.fly_leg(direction, cm) {
                warn!(error = %e, "return-home leg failed, emergency landing");
                self.emergency_land()?;
                return Ok(ReturnHomeOutcome {
                    legs_flown: flown,
                    fell_back_to_emergency: true,
                });
            }
            flown += 1;
        }

        self.land()?;
        info!("return home complete");
        Ok(ReturnHomeOutcome {
            legs_flown: flown,
            fell_back_to_emergency: false,
        })
    }

    /// Snapshot of battery, height, flight state, and position.
    pub fn status(&self) -> DroneStatus {
        let (battery_pct, height_cm) = {
            let motion = self.lock_motion();
            (motion.battery_pct(), motion.height_cm())
        };
        DroneStatus {
            battery_pct,
            height_cm,
            state: self.state.state(),
            flying: self.state.is_flying(),
            position: self.state.position(),
            distance_from_home_cm: self.state.distance_from_home(),
        }
    }

    /// One motion leg with state bookkeeping; distance is taken as-is so
    /// return-home corrections can be shorter than the normal minimum.
    fn fly_leg(&self, direction: Direction, distance_cm: u32) -> Result<()> {
        if direction == Direction::Up {
            let height = self.lock_motion().height_cm();
            if height + distance_cm as i32 > self.limits.max_height_cm {
                return Err(Error::HeightLimit {
                    limit_cm: self.limits.max_height_cm,
                });
            }
        }
        self.state.request_transition(FlightState::Flying)?;
        let translated = self.lock_motion().translate(direction, distance_cm);
        if let Err(e) = translated {
            let _ = self.recover_to_hover();
            return Err(e);
        }
        let (dx, dy, dz) = direction.unit_delta(distance_cm as f32);
        self.state.record_motion(MotionDelta::translation(dx, dy, dz))?;
        self.state.request_transition(FlightState::Hovering)?;
        Ok(())
    }

    fn recover_to_hover(&self) -> Result<()> {
        let _ = self.lock_motion().hover();
        self.state.request_transition(FlightState::Hovering)?;
        Ok(())
    }

    fn lock_motion(&self) -> MutexGuard<'_, Box<dyn MotionDriver>> {
        self.motion.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_vision(&self) -> MutexGuard<'_, Box<dyn VisionDriver>> {
        self.vision.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decompose the vector back to home into per-axis legs of at most
/// `max_leg_cm`, altitude first.
fn plan_return_legs(x: f32, y: f32, z: f32, max_leg_cm: u32) -> Vec<(Direction, u32)> {
    let mut legs = Vec::new();
    let mut push_axis = |offset: f32, positive: Direction, negative: Direction| {
        let mut remaining = offset.abs().round() as u32;
        let direction = if offset > 0.0 { negative } else { positive };
        while remaining >= 1 {
            let leg = remaining.min(max_leg_cm);
            legs.push((direction, leg));
            remaining -= leg;
        }
    };
    push_axis(z, Direction::Up, Direction::Down);
    push_axis(x, Direction::Forward, Direction::Back);
    push_axis(y, Direction::Right, Direction::Left);
    legs
}
