use crate::{Error, MotionDelta, Position, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Discrete phase of the vehicle's flight lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightState {
    Grounded,
    TakingOff,
    Hovering,
    Flying,
    Landing,
    Aborted,
    Error,
}

impl FlightState {
    /// Successor states reachable through a normal transition request.
    fn allowed_successors(self) -> &'static [FlightState] {
        use FlightState::*;
        match self {
            Grounded => &[TakingOff],
            TakingOff => &[Hovering, Error],
            Hovering => &[Flying, Landing, Aborted, Error],
            Flying => &[Hovering, Landing, Aborted, Error],
            Landing => &[Grounded, Error],
            // An aborted vehicle must explicitly resume or land.
            Aborted => &[Hovering, Landing],
            // Error is only left through an explicit reset.
            Error => &[Grounded],
        }
    }

    pub fn is_flying(self) -> bool {
        matches!(
            self,
            FlightState::TakingOff | FlightState::Hovering | FlightState::Flying | FlightState::Landing
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            FlightState::Grounded => "grounded",
            FlightState::TakingOff => "taking_off",
            FlightState::Hovering => "hovering",
            FlightState::Flying => "flying",
            FlightState::Landing => "landing",
            FlightState::Aborted => "aborted",
            FlightState::Error => "error",
        }
    }
}

impl std::fmt::Display for FlightState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

type TransitionCallback = Box<dyn Fn(FlightState, FlightState) + Send + Sync>;

struct Inner {
    state: FlightState,
    position: Position,
}

/// Thread-safe flight state machine.
///
/// Gatekeeper for whether a requested physical action is legal right now.
/// Transition checks and the resulting state change happen under one lock,
/// so an illegal request never partially applies.
pub struct StateMachine {
    inner: Mutex<Inner>,
    callbacks: Mutex<Vec<TransitionCallback>>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: FlightState::Grounded,
                position: Position::HOME,
            }),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Current flight state.
    pub fn state(&self) -> FlightState {
        self.lock_inner().state
    }

    /// Current position estimate relative to the takeoff point.
    pub fn position(&self) -> Position {
        self.lock_inner().position
    }

    /// Straight-line distance from the origin recorded at the most recent
    /// `Grounded -> TakingOff` transition.
    pub fn distance_from_home(&self) -> f32 {
        self.lock_inner().position.distance_from_home()
    }

    pub fn is_flying(&self) -> bool {
        self.state().is_flying()
    }

    /// Request a transition to `to`.
    ///
    /// Atomic check-and-set: on an illegal pair the state is left unchanged
    /// and `InvalidStateTransition` is returned. A same-state request is a
    /// no-op that succeeds without notifying observers.
    pub fn request_transition(&self, to: FlightState) -> Result<()> {
        let from = {
            let mut inner = self.lock_inner();
            let from = inner.state;
            if from == to {
                return Ok(());
            }
            if !from.allowed_successors().contains(&to) {
                return Err(Error::InvalidStateTransition { from, to });
            }
            inner.state = to;
            // Takeoff re-anchors the home origin.
            if from == FlightState::Grounded && to == FlightState::TakingOff {
                inner.position = Position::HOME;
            }
            from
        };
        debug!(from = from.name(), to = to.name(), "flight state transition");
        self.notify(from, to);
        Ok(())
    }

    /// Force a transition, bypassing the legality table.
    ///
    /// Reserved for the emergency-landing path; observers are still notified.
    pub fn force_transition(&self, to: FlightState) {
        let from = {
            let mut inner = self.lock_inner();
            let from = inner.state;
            if from == to {
                return;
            }
            inner.state = to;
            from
        };
        warn!(from = from.name(), to = to.name(), "forced flight state transition");
        self.notify(from, to);
    }

    /// Apply a translation/rotation to the position estimate.
    ///
    /// Only legal while hovering or flying; any other state is rejected
    /// without touching the estimate.
    pub fn record_motion(&self, delta: MotionDelta) -> Result<()> {
        let mut inner = self.lock_inner();
        match inner.state {
            FlightState::Hovering | FlightState::Flying => {
                inner.position.apply(delta);
                Ok(())
            }
            other => Err(Error::MotionNotAllowed(other)),
        }
    }

    /// Register an observer called with `(from, to)` after every transition.
    pub fn on_transition<F>(&self, callback: F)
    where
        F: Fn(FlightState, FlightState) + Send + Sync + 'static,
    {
        self.lock_callbacks().push(Box::new(callback));
    }

    fn notify(&self, from: FlightState, to: FlightState) {
        let callbacks = self.lock_callbacks();
        for callback in callbacks.iter() {
            callback(from, to);
        }
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_callbacks(&self) -> std::sync::MutexGuard<'_, Vec<TransitionCallback>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("state", &self.state())
            .field("position", &self.position())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_initial_state() {
        let sm = StateMachine::new();
        assert_eq!(sm.state(), FlightState::Grounded);
        assert!(!sm.is_flying());
    }

    #[test]
    fn test_normal_flight_cycle() {
        let sm = StateMachine::new();
        sm.request_transition(FlightState::TakingOff).unwrap();
        sm.request_transition(FlightState::Hovering).unwrap();
        sm.request_transition(FlightState::Flying).unwrap();
        sm.request_transition(FlightState::Hovering).unwrap();
        sm.request_transition(FlightState::Landing).unwrap();
        sm.request_transition(FlightState::Grounded).unwrap();
        assert_eq!(sm.state(), FlightState::Grounded);
    }

    #[test]
    fn test_illegal_transition_leaves_state_unchanged() {
        let sm = StateMachine::new();
        let err = sm.request_transition(FlightState::Hovering).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidStateTransition {
                from: FlightState::Grounded,
                to: FlightState::Hovering
            }
        );
        assert_eq!(sm.state(), FlightState::Grounded);
    }

    #[test]
    fn test_same_state_is_noop() {
        let sm = StateMachine::new();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        sm.on_transition(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sm.request_transition(FlightState::Grounded).unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_takeoff_resets_home_origin() {
        let sm = StateMachine::new();
        sm.request_transition(FlightState::TakingOff).unwrap();
        sm.request_transition(FlightState::Hovering).unwrap();
        sm.record_motion(MotionDelta::translation(60.0, 0.0, 0.0)).unwrap();
        assert!(sm.distance_from_home() > 0.0);

        sm.request_transition(FlightState::Landing).unwrap();
        sm.request_transition(FlightState::Grounded).unwrap();
        sm.request_transition(FlightState::TakingOff).unwrap();
        assert_eq!(sm.distance_from_home(), 0.0);
    }

    #[test]
    fn test_motion_rejected_on_ground() {
        let sm = StateMachine::new();
        let err = sm
            .record_motion(MotionDelta::translation(10.0, 0.0, 0.0))
            .unwrap_err();
        assert_eq!(err, Error::MotionNotAllowed(FlightState::Grounded));
    }

    #[test]
    fn test_aborted_must_resume_or_land() {
        let sm = StateMachine::new();
        sm.request_transition(FlightState::TakingOff).unwrap();
        sm.request_transition(FlightState::Hovering).unwrap();
        sm.request_transition(FlightState::Aborted).unwrap();

        assert!(sm.request_transition(FlightState::Flying).is_err());
        sm.request_transition(FlightState::Hovering).unwrap();
        assert_eq!(sm.state(), FlightState::Hovering);
    }

    #[test]
    fn test_error_only_reset_to_grounded() {
        let sm = StateMachine::new();
        sm.request_transition(FlightState::TakingOff).unwrap();
        sm.request_transition(FlightState::Error).unwrap();
        assert!(sm.request_transition(FlightState::Hovering).is_err());
        sm.request_transition(FlightState::Grounded).unwrap();
    }

    #[test]
    fn test_concurrent_transitions_single_winner() {
        let sm = Arc::new(StateMachine::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let sm = sm.clone();
            handles.push(std::thread::spawn(move || {
                sm.request_transition(FlightState::TakingOff).is_ok()
            }));
        }
        let winners = handles
            .into_iter()
            .map(|h| h.join())
            .filter(|r| matches!(r, Ok(true)))
            .count();
        // First request wins; same-state retries also report success.
        assert!(winners >= 1);
        assert_eq!(sm.state(), FlightState::TakingOff);
    }

    #[test]
    fn test_transition_callbacks_fire() {
        let sm = StateMachine::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        sm.on_transition(move |from, to| {
            if let Ok(mut v) = log.lock() {
                v.push((from, to));
            }
        });

        sm.request_transition(FlightState::TakingOff).unwrap();
        sm.request_transition(FlightState::Hovering).unwrap();

        let v = seen.lock().unwrap();
        assert_eq!(
            *v,
            vec![
                (FlightState::Grounded, FlightState::TakingOff),
                (FlightState::TakingOff, FlightState::Hovering),
            ]
        );
    }
}
