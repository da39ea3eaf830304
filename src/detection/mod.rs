//! Debounced detection state machine.
//!
//! A detection is a single reading that falls further below the baseline
//! than the threshold. `min_successive_detections` consecutive detections arm
//! the machine; the next one confirms an event. Any non-detection ends the
//! cycle and returns the machine to idle.

use crate::hal::Clock;

/// Where the machine sits in a detection cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DetectionPhase {
    /// No detections in the current run
    Idle,
    /// Detections accumulating, event not confirmed yet
    Arming,
    /// Event confirmed and still in progress
    Active,
}

/// Transition reported by [`DetectionMachine::process`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DetectionEvent {
    /// An event was confirmed at `at_ms`
    Started { at_ms: u64 },
    /// A detection run ended
    Ended {
        at_ms: u64,
        width_ms: u64,
        /// False when the run never reached confirmation
        confirmed: bool,
    },
}

/// Whether `distance` has dropped far enough below `baseline` to count.
///
/// An increase in distance never counts. Inputs are expected to respect the
/// [`RangeSource`](crate::hal::RangeSource) range contract.
pub fn is_detection(baseline: i64, distance: i64, threshold: i64) -> bool {
    (baseline - distance) > threshold
}

/// Successive-detection counter plus event bookkeeping
#[derive(Debug, Clone, Default)]
pub struct DetectionMachine {
    successive_detections: u32,
    event_start_time: u64,
    last_event_width: u64,
    num_detections: u64,
}

impl DetectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything, including the detection count
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Drop the current run without reporting an end
    pub fn reset_event_status(&mut self) {
        self.successive_detections = 0;
    }

    /// Advance the machine by one sample.
    ///
    /// `clock` is only read when an event starts or ends. With
    /// `strict_pairing` set, a run that never reached confirmation ends
    /// silently and leaves `last_event_width` untouched.
    pub fn process(
        &mut self,
        detected: bool,
        min_successive_detections: u32,
        strict_pairing: bool,
        clock: &dyn Clock,
    ) -> Option<DetectionEvent> {
        if detected {
            if self.successive_detections == min_successive_detections {
                self.successive_detections += 1;
                self.event_start_time = clock.now_ms();
                self.num_detections += 1;
                return Some(DetectionEvent::Started {
                    at_ms: self.event_start_time,
                });
            } else if self.successive_detections < min_successive_detections {
                self.successive_detections += 1;
            }
            return None;
        }

        let mut event = None;
        if self.successive_detections > 0 {
            let confirmed = self.successive_detections > min_successive_detections;
            if confirmed || !strict_pairing {
                let now = clock.now_ms();
                self.last_event_width = now.saturating_sub(self.event_start_time);
                event = Some(DetectionEvent::Ended {
                    at_ms: now,
                    width_ms: self.last_event_width,
                    confirmed,
                });
            }
        }
        self.successive_detections = 0;
        event
    }

    pub fn phase(&self, min_successive_detections: u32) -> DetectionPhase {
        if self.successive_detections == 0 {
            DetectionPhase::Idle
        } else if self.successive_detections > min_successive_detections {
            DetectionPhase::Active
        } else {
            DetectionPhase::Arming
        }
    }

    pub fn successive_detections(&self) -> u32 {
        self.successive_detections
    }

    pub fn event_start_time(&self) -> u64 {
        self.event_start_time
    }

    pub fn last_event_width(&self) -> u64 {
        self.last_event_width
    }

    pub fn num_detections(&self) -> u64 {
        self.num_detections
    }
}
