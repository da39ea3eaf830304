//! The tripwire detector.
//!
//! `Tripwire` owns a range source, a clock and two optional callbacks. The
//! host calls [`Tripwire::start`] once (which calibrates) and then
//! [`Tripwire::update`] on a fixed cadence. Callbacks run inline on the
//! calling thread, so they should return quickly.

use std::fmt;

use crate::calibration::{CalibrationProcedure, CalibrationState};
use crate::config::TripwireConfig;
use crate::detection::{is_detection, DetectionEvent, DetectionMachine, DetectionPhase};
use crate::error::CalibrationError;
use crate::hal::{Clock, RangeSource, SystemClock};

/// Callback fired when an event starts or ends
pub type EventCallback = Box<dyn FnMut()>;

/// Line-of-sight detector for a ranging sensor
pub struct Tripwire<C: Clock = SystemClock> {
    /// Tunables; change them before `start()`
    pub config: TripwireConfig,
    clock: C,
    range: Option<Box<dyn RangeSource>>,
    on_event_start: Option<EventCallback>,
    on_event_end: Option<EventCallback>,
    calibration: CalibrationState,
    /// Why the last calibration did not run, if it did not
    calibration_skipped: Option<CalibrationError>,
    detection: DetectionMachine,
    distance: i64,
}

impl Tripwire<SystemClock> {
    /// Create a tripwire with default configuration and the system clock.
    pub fn new(range: Option<Box<dyn RangeSource>>) -> Self {
        Self::with_clock(TripwireConfig::default(), SystemClock::new(), range)
    }
}

impl Default for Tripwire<SystemClock> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<C: Clock> Tripwire<C> {
    pub fn with_clock(
        config: TripwireConfig,
        clock: C,
        range: Option<Box<dyn RangeSource>>,
    ) -> Self {
        Self {
            config,
            clock,
            range,
            on_event_start: None,
            on_event_end: None,
            calibration: CalibrationState::new_default(),
            calibration_skipped: Some(CalibrationError::NotRun),
            detection: DetectionMachine::new(),
            distance: 0,
        }
    }

    /// Reset runtime state and calibrate.
    ///
    /// `update` must be called regularly afterwards.
    pub fn start(&mut self) -> CalibrationState {
        self.detection.reset();
        tracing::info!(
            "[Tripwire] Starting: threshold={} debounce={} strict_pairing={}",
            self.config.distance_threshold,
            self.config.min_successive_detections,
            self.config.strict_event_pairing
        );
        self.calibrate()
    }

    /// Re-estimate the baseline.
    ///
    /// Nothing should move in front of the sensor while this runs. Blocks for
    /// roughly `baseline_read_interval` per reading. Skipped, leaving the
    /// previous baseline in place, when no range source is set or the
    /// distance threshold is zero.
    pub fn calibrate(&mut self) -> CalibrationState {
        self.calibration.is_calibrated = false;

        let Some(range) = self.range.as_deref_mut() else {
            tracing::warn!("[Tripwire] Calibration skipped: no range source");
            self.calibration_skipped = Some(CalibrationError::NoRangeSource);
            return self.calibration;
        };
        if self.config.distance_threshold == 0 {
            tracing::warn!("[Tripwire] Calibration skipped: distance threshold is zero");
            self.calibration_skipped = Some(CalibrationError::ThresholdUnset);
            return self.calibration;
        }

        self.calibration_skipped = None;

        self.calibration = CalibrationProcedure::run(range, &self.clock, &self.config);

        if self.calibration.is_calibrated {
            tracing::info!(
                "[Tripwire] Calibrated: baseline={} variance={} reads={}",
                self.calibration.baseline_distance,
                self.calibration.baseline_variance,
                self.calibration.baseline_reads
            );
        } else {
            tracing::warn!(
                "[Tripwire] Calibration failed: variance {} not below {} after {} reads",
                self.calibration.baseline_variance,
                self.config.max_baseline_variance,
                self.calibration.baseline_reads
            );
        }
        self.calibration
    }

    /// Take one reading and advance the detection state machine.
    ///
    /// Fires the start or end callback when the reading causes a transition,
    /// and returns that transition. Does nothing without a range source.
    pub fn update(&mut self) -> Option<DetectionEvent> {
        let range = self.range.as_deref_mut()?;
        self.distance = range.read_range();

        let detected = is_detection(
            self.calibration.baseline_distance,
            self.distance,
            self.config.distance_threshold,
        );
        let event = self.detection.process(
            detected,
            self.config.min_successive_detections,
            self.config.strict_event_pairing,
            &self.clock,
        );

        match event {
            Some(DetectionEvent::Started { at_ms }) => {
                tracing::debug!(
                    "[Tripwire] Event {} started at {}ms (distance={})",
                    self.detection.num_detections(),
                    at_ms,
                    self.distance
                );
                if let Some(callback) = self.on_event_start.as_mut() {
                    callback();
                }
            }
            Some(DetectionEvent::Ended {
                width_ms,
                confirmed,
                ..
            }) => {
                tracing::debug!(
                    "[Tripwire] Event ended after {}ms (confirmed={})",
                    width_ms,
                    confirmed
                );
                if let Some(callback) = self.on_event_end.as_mut() {
                    callback();
                }
            }
            None => {}
        }
        event
    }

    /// Replace the range source. `None` keeps the current one.
    pub fn set_range_function(&mut self, range: Option<Box<dyn RangeSource>>) {
        if let Some(range) = range {
            self.range = Some(range);
        }
    }

    /// Replace the event start callback. `None` keeps the current one.
    pub fn set_event_start_callback(&mut self, callback: Option<EventCallback>) {
        if let Some(callback) = callback {
            self.on_event_start = Some(callback);
        }
    }

    /// Replace the event end callback. `None` keeps the current one.
    pub fn set_event_end_callback(&mut self, callback: Option<EventCallback>) {
        if let Some(callback) = callback {
            self.on_event_end = Some(callback);
        }
    }

    /// Forget the current detection run without firing the end callback.
    ///
    /// For hosts that suspect the state machine is stuck, e.g. after a long
    /// gap in updates.
    pub fn reset_event_status(&mut self) {
        tracing::debug!(
            "[Tripwire] Event status reset at {} successive detections",
            self.detection.successive_detections()
        );
        self.detection.reset_event_status();
    }

    /// Explain why the tripwire is not calibrated, if it is not.
    ///
    /// A skipped or never-run calibration is reported as such rather than
    /// through the baseline values left over from an earlier run.
    pub fn require_calibrated(&self) -> Result<(), CalibrationError> {
        if self.calibration.is_calibrated {
            return Ok(());
        }
        if let Some(reason) = &self.calibration_skipped {
            return Err(reason.clone());
        }
        self.calibration
            .require_calibrated(self.config.max_baseline_variance)
    }

    pub fn has_range_source(&self) -> bool {
        self.range.is_some()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    pub fn baseline_distance(&self) -> i64 {
        self.calibration.baseline_distance
    }

    pub fn baseline_variance(&self) -> i64 {
        self.calibration.baseline_variance
    }

    /// Last distance read by `update`
    pub fn distance(&self) -> i64 {
        self.distance
    }

    pub fn num_detections(&self) -> u64 {
        self.detection.num_detections()
    }

    /// Time the last event started [ms]
    pub fn event_start_time(&self) -> u64 {
        self.detection.event_start_time()
    }

    /// Width of the last event [ms]
    pub fn last_event_width(&self) -> u64 {
        self.detection.last_event_width()
    }

    pub fn successive_detections(&self) -> u32 {
        self.detection.successive_detections()
    }

    pub fn phase(&self) -> DetectionPhase {
        self.detection.phase(self.config.min_successive_detections)
    }

    pub fn is_event_active(&self) -> bool {
        self.phase() == DetectionPhase::Active
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> fmt::Debug for Tripwire<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tripwire")
            .field("config", &self.config)
            .field("calibration", &self.calibration)
            .field("calibration_skipped", &self.calibration_skipped)
            .field("detection", &self.detection)
            .field("distance", &self.distance)
            .field("has_range_source", &self.range.is_some())
            .field("has_event_start", &self.on_event_start.is_some())
            .field("has_event_end", &self.on_event_end.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "tripwire_tests.rs"]
mod tests;
