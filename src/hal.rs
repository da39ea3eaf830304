//! Capabilities the detector consumes from its host.
//!
//! The tripwire never talks to sensor hardware or timers directly. A host
//! wires a [`RangeSource`] (anything that yields the current distance) and a
//! [`Clock`] (monotonic milliseconds plus a blocking sleep).

use std::thread;
use std::time::{Duration, Instant};

/// Source of distance readings.
///
/// Units are up to the sensor, but must stay consistent for the lifetime of a
/// detector. Reads are expected to be cheap relative to the polling cadence.
///
/// Readings must stay well inside the `i64` range (magnitude below
/// `i64::MAX / 4`): calibration and detection use plain integer arithmetic on
/// sums and differences of readings, which overflows on extreme values.
pub trait RangeSource {
    fn read_range(&mut self) -> i64;
}

impl<F> RangeSource for F
where
    F: FnMut() -> i64,
{
    fn read_range(&mut self) -> i64 {
        self()
    }
}

/// Monotonic time source with a blocking sleep used during calibration.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> u64;

    /// Block the calling thread for `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);
}

/// Default clock backed by `Instant::now` and `thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        if ms > 0 {
            thread::sleep(Duration::from_millis(ms));
        }
    }
}
