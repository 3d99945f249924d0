//! abort-signal: Process-wide cooperative abort flag
//!
//! A cloneable handle around one atomic flag plus a time-sliced,
//! interruptible wait. Any subsystem holding a clone can trigger an abort;
//! long-running operations poll the flag between physical steps so they stop
//! within one slice of the trigger instead of being killed mid-write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Worst-case latency between `set()` and an in-progress wait observing it.
pub const POLL_SLICE: Duration = Duration::from_millis(100);

/// Returned when an interruptible wait observes the abort flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation interrupted by abort signal")]
pub struct Interrupted;

/// Shared abort flag with an interruptible sleep primitive.
///
/// Clones share the same underlying flag. The flag is never cleared
/// implicitly; an operator must call [`InterruptSignal::clear`] before new
/// missions can wait again.
#[derive(Debug, Clone, Default)]
pub struct InterruptSignal {
    flag: Arc<AtomicBool>,
}

impl InterruptSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the abort flag. Idempotent.
    pub fn set(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            warn!("abort signal raised");
        }
    }

    /// Clear the abort flag. Idempotent; a no-op when not set.
    pub fn clear(&self) {
        if self.flag.swap(false, Ordering::SeqCst) {
            debug!("abort signal cleared");
        }
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `seconds`, polling the flag every [`POLL_SLICE`].
    ///
    /// Returns `Err(Interrupted)` as soon as a slice observes the flag set.
    /// A zero or negative duration returns immediately without checking.
    pub async fn wait(&self, seconds: f64) -> Result<(), Interrupted> {
        if seconds <= 0.0 {
            return Ok(());
        }
        let mut remaining = Duration::from_secs_f64(seconds);
        while !remaining.is_zero() {
            let slice = remaining.min(POLL_SLICE);
            tokio::time::sleep(slice).await;
            if self.is_set() {
                warn!("abort observed during wait");
                return Err(Interrupted);
            }
            remaining = remaining.saturating_sub(slice);
        }
        Ok(())
    }
}
