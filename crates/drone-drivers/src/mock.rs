use crate::{Detection, Direction, Error, FlipDirection, Frame, MotionDriver, Result, VisionDriver};
use std::sync::{Arc, Mutex, PoisonError};
use time::OffsetDateTime;
use tracing::debug;

const HOVER_HEIGHT_CM: i32 = 50;

/// Handle for injecting a one-shot driver fault into a [`MockMotion`]
/// already handed to a controller.
#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    pending: Arc<Mutex<Option<String>>>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a fault: the next motion command fails with this message.
    pub fn arm(&self, message: impl Into<String>) {
        *self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    fn take(&self) -> Option<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Deterministic simulated motion driver.
///
/// Tracks battery and height only; position bookkeeping belongs to the
/// flight state machine. No real time passes.
pub struct MockMotion {
    flying: bool,
    height_cm: i32,
    battery: f32,
    faults: FaultInjector,
}

impl MockMotion {
    pub fn new() -> Self {
        Self {
            flying: false,
            height_cm: 0,
            battery: 100.0,
            faults: FaultInjector::new(),
        }
    }

    pub fn with_battery(pct: u8) -> Self {
        Self {
            battery: f32::from(pct),
            ..Self::new()
        }
    }

    pub fn with_fault_injector(mut self, faults: FaultInjector) -> Self {
        self.faults = faults;
        self
    }

    fn drain(&mut self, pct: f32) {
        self.battery = (self.battery - pct).max(0.0);
    }

    fn take_fault(&mut self) -> Result<()> {
        match self.faults.take() {
            Some(message) => Err(Error::Driver(message)),
            None => Ok(()),
        }
    }
}

impl Default for MockMotion {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionDriver for MockMotion {
    fn takeoff(&mut self) -> Result<()> {
        self.take_fault()?;
        debug!("[mock] takeoff");
        self.flying = true;
        self.height_cm = HOVER_HEIGHT_CM;
        self.drain(1.0);
        Ok(())
    }

    fn land(&mut self) -> Result<()> {
        self.take_fault()?;
        debug!("[mock] land");
        self.flying = false;
        self.height_cm = 0;
        Ok(())
    }

    fn translate(&mut self, direction: Direction, distance_cm: u32) -> Result<()> {
        self.take_fault()?;
        debug!(direction = direction.as_str(), distance_cm, "[mock] translate");
        match direction {
            Direction::Up => self.height_cm += distance_cm as i32,
            Direction::Down => self.height_cm = (self.height_cm - distance_cm as i32).max(0),
            _ => {}
        }
        self.drain(0.2);
        Ok(())
    }

    fn rotate(&mut self, degrees: i32) -> Result<()> {
        self.take_fault()?;
        debug!(degrees, "[mock] rotate");
        self.drain(0.1);
        Ok(())
    }

    fn flip(&mut self, direction: FlipDirection) -> Result<()> {
        self.take_fault()?;
        debug!(?direction, "[mock] flip");
        self.drain(5.0);
        Ok(())
    }

    fn hover(&mut self) -> Result<()> {
        debug!("[mock] hover");
        Ok(())
    }

    fn battery_pct(&self) -> u8 {
        self.battery as u8
    }

    fn height_cm(&self) -> i32 {
        self.height_cm
    }
}

/// Simulated vision driver with a scripted match schedule.
pub struct MockVision {
    captures: u64,
    match_on_capture: Option<u64>,
}

impl MockVision {
    /// Never reports a match.
    pub fn never() -> Self {
        Self {
            captures: 0,
            match_on_capture: None,
        }
    }

    /// Reports a match when classifying the `n`-th captured frame (1-based).
    pub fn match_on_capture(n: u64) -> Self {
        Self {
            captures: 0,
            match_on_capture: Some(n),
        }
    }
}

impl VisionDriver for MockVision {
    fn capture(&mut self) -> Result<Frame> {
        self.captures += 1;
        // Simple gray ramp test pattern.
        let width = 320u32;
        let height = 240u32;
        let mut data = vec![0u8; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                data[(y * width + x) as usize] = ((x + y) % 256) as u8;
            }
        }
        Ok(Frame {
            width,
            height,
            data,
            ts: Some(OffsetDateTime::now_utc()),
        })
    }

    fn classify(&mut self, _frame: &Frame, description: &str) -> Result<Detection> {
        let matched = self.match_on_capture == Some(self.captures);
        Ok(Detection {
            matched,
            confidence: if matched { 0.9 } else { 0.1 },
            label: description.to_string(),
        })
    }
}
