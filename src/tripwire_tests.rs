use super::*;
use crate::testing::{ManualClock, ScriptedRange};
use std::cell::Cell;
use std::rc::Rc;

const POLL_MS: u64 = 50;

struct Harness {
    tripwire: Tripwire<ManualClock>,
    source: ScriptedRange,
    clock: ManualClock,
    starts: Rc<Cell<u32>>,
    ends: Rc<Cell<u32>>,
}

fn counter(count: &Rc<Cell<u32>>) -> Option<EventCallback> {
    let count = Rc::clone(count);
    Some(Box::new(move || count.set(count.get() + 1)))
}

/// Tripwire calibrated against a still scene at distance 100.
fn harness(min_successive_detections: u32) -> Harness {
    let source = ScriptedRange::constant(100);
    let clock = ManualClock::new(0);
    let config = TripwireConfig {
        min_successive_detections,
        baseline_read_interval: 1,
        ..TripwireConfig::default()
    };
    let mut tripwire =
        Tripwire::with_clock(config, clock.clone(), Some(Box::new(source.clone())));

    let starts = Rc::new(Cell::new(0));
    let ends = Rc::new(Cell::new(0));
    tripwire.set_event_start_callback(counter(&starts));
    tripwire.set_event_end_callback(counter(&ends));

    let state = tripwire.start();
    assert!(state.is_calibrated);
    assert_eq!(state.baseline_distance, 100);

    Harness {
        tripwire,
        source,
        clock,
        starts,
        ends,
    }
}

impl Harness {
    fn feed(&mut self, reading: i64) -> Option<DetectionEvent> {
        self.clock.advance(POLL_MS);
        self.source.push(reading);
        self.tripwire.update()
    }
}

#[test]
fn test_single_event_round_trip() {
    let mut h = harness(0);

    assert_eq!(h.feed(100), None);
    assert_eq!(h.feed(100), None);
    let started_at = h.clock.now_ms() + POLL_MS;
    assert_eq!(h.feed(20), Some(DetectionEvent::Started { at_ms: started_at }));
    assert_eq!(h.starts.get(), 1);
    assert_eq!(h.feed(20), None);
    assert!(h.tripwire.is_event_active());
    assert!(matches!(h.feed(100), Some(DetectionEvent::Ended { .. })));

    assert_eq!(h.starts.get(), 1);
    assert_eq!(h.ends.get(), 1);
    assert_eq!(h.tripwire.num_detections(), 1);
    assert_eq!(h.tripwire.event_start_time(), started_at);
    assert_eq!(h.tripwire.last_event_width(), 2 * POLL_MS);
    assert_eq!(h.tripwire.distance(), 100);
    assert_eq!(h.tripwire.phase(), DetectionPhase::Idle);
}

#[test]
fn test_reading_at_threshold_is_not_a_detection() {
    let mut h = harness(0);
    assert_eq!(h.feed(30), None);
    assert_eq!(h.feed(500), None);
    assert_eq!(h.starts.get(), 0);
    assert_eq!(h.tripwire.successive_detections(), 0);
}

#[test]
fn test_debounce_requires_full_run() {
    let mut h = harness(3);

    for _ in 0..3 {
        assert_eq!(h.feed(10), None);
    }
    assert_eq!(h.tripwire.phase(), DetectionPhase::Arming);
    assert_eq!(h.starts.get(), 0);

    assert!(matches!(h.feed(10), Some(DetectionEvent::Started { .. })));
    assert_eq!(h.starts.get(), 1);
    assert_eq!(h.tripwire.num_detections(), 1);

    h.feed(10);
    h.feed(10);
    assert_eq!(h.starts.get(), 1);
    assert_eq!(h.tripwire.successive_detections(), 4);
}

#[test]
fn test_short_run_fires_unmatched_end() {
    let mut h = harness(3);

    h.feed(10);
    h.feed(10);
    let event = h.feed(100);

    assert!(matches!(
        event,
        Some(DetectionEvent::Ended {
            confirmed: false,
            ..
        })
    ));
    assert_eq!(h.starts.get(), 0);
    assert_eq!(h.ends.get(), 1);
    assert_eq!(h.tripwire.num_detections(), 0);
    assert_eq!(h.tripwire.successive_detections(), 0);
    // Width is measured from a start time that was never set for this run
    assert_eq!(h.tripwire.event_start_time(), 0);
    assert_eq!(h.tripwire.last_event_width(), h.clock.now_ms());
}

#[test]
fn test_strict_pairing_suppresses_unmatched_end() {
    let mut h = harness(3);
    h.tripwire.config.strict_event_pairing = true;

    h.feed(10);
    h.feed(10);
    assert_eq!(h.feed(100), None);
    assert_eq!(h.ends.get(), 0);
    assert_eq!(h.tripwire.successive_detections(), 0);

    for _ in 0..4 {
        h.feed(10);
    }
    assert!(matches!(
        h.feed(100),
        Some(DetectionEvent::Ended {
            confirmed: true,
            ..
        })
    ));
    assert_eq!(h.starts.get(), 1);
    assert_eq!(h.ends.get(), 1);
}

#[test]
fn test_reset_event_status_allows_fresh_event() {
    let mut h = harness(0);

    h.feed(10);
    assert_eq!(h.starts.get(), 1);
    h.tripwire.reset_event_status();
    assert_eq!(h.tripwire.successive_detections(), 0);

    // The next detection confirms a new event straight away
    assert!(matches!(h.feed(10), Some(DetectionEvent::Started { .. })));
    assert_eq!(h.starts.get(), 2);
    assert_eq!(h.tripwire.num_detections(), 2);

    h.tripwire.reset_event_status();
    assert_eq!(h.feed(100), None);
    assert_eq!(h.ends.get(), 0);
}

#[test]
fn test_idle_updates_are_idempotent() {
    let mut h = harness(0);
    for _ in 0..25 {
        assert_eq!(h.feed(95), None);
    }
    assert_eq!(h.tripwire.num_detections(), 0);
    assert_eq!(h.tripwire.event_start_time(), 0);
    assert_eq!(h.starts.get(), 0);
    assert_eq!(h.ends.get(), 0);
}

#[test]
fn test_update_never_touches_calibration() {
    let mut h = harness(0);
    let before = *h.tripwire.calibration();
    for reading in [10, 10, 100, 400, 10, 100] {
        h.feed(reading);
    }
    assert_eq!(*h.tripwire.calibration(), before);
}

#[test]
fn test_start_resets_runtime_state() {
    let mut h = harness(0);
    h.feed(10);
    h.feed(100);
    assert_eq!(h.tripwire.num_detections(), 1);

    h.tripwire.start();
    assert_eq!(h.tripwire.num_detections(), 0);
    assert_eq!(h.tripwire.event_start_time(), 0);
    assert_eq!(h.tripwire.last_event_width(), 0);
    assert_eq!(h.tripwire.successive_detections(), 0);
}

#[test]
fn test_missing_range_source_is_a_no_op() {
    let clock = ManualClock::new(0);
    let mut tripwire = Tripwire::with_clock(TripwireConfig::default(), clock.clone(), None);

    let state = tripwire.start();
    assert!(!state.is_calibrated);
    assert_eq!(clock.total_slept(), 0);
    assert_eq!(tripwire.update(), None);
    assert_eq!(tripwire.distance(), 0);
    assert_eq!(
        tripwire.require_calibrated(),
        Err(CalibrationError::NoRangeSource)
    );
}

#[test]
fn test_zero_threshold_skips_calibration() {
    let source = ScriptedRange::constant(100);
    let config = TripwireConfig {
        distance_threshold: 0,
        ..TripwireConfig::default()
    };
    let mut tripwire =
        Tripwire::with_clock(config, ManualClock::new(0), Some(Box::new(source.clone())));

    assert!(!tripwire.start().is_calibrated);
    assert_eq!(source.reads(), 0);
    assert_eq!(tripwire.baseline_distance(), 0);
    assert_eq!(
        tripwire.require_calibrated(),
        Err(CalibrationError::ThresholdUnset)
    );
}

#[test]
fn test_skipped_calibration_keeps_previous_baseline() {
    let mut h = harness(0);
    h.tripwire.config.distance_threshold = 0;

    let state = h.tripwire.calibrate();
    assert!(!state.is_calibrated);
    assert_eq!(state.baseline_distance, 100);
}

#[test]
fn test_failed_calibration_reports_unstable_baseline() {
    let source = ScriptedRange::new((0..80).map(|i| if i % 2 == 0 { 0 } else { 1000 }));
    let mut tripwire = Tripwire::with_clock(
        TripwireConfig::default(),
        ManualClock::new(0),
        Some(Box::new(source.clone())),
    );

    let state = tripwire.start();
    assert!(!state.is_calibrated);
    assert_eq!(source.reads(), 40);
    assert!(matches!(
        tripwire.require_calibrated(),
        Err(CalibrationError::UnstableBaseline { reads: 40, .. })
    ));
}

#[test]
fn test_none_setters_keep_existing_values() {
    let mut h = harness(0);
    h.tripwire.set_range_function(None);
    h.tripwire.set_event_start_callback(None);
    h.tripwire.set_event_end_callback(None);

    h.feed(10);
    h.feed(100);
    assert_eq!(h.starts.get(), 1);
    assert_eq!(h.ends.get(), 1);
    assert!(h.tripwire.has_range_source());
}

#[test]
fn test_callbacks_can_be_replaced() {
    let mut h = harness(0);
    let replacement = Rc::new(Cell::new(0));
    h.tripwire.set_event_start_callback(counter(&replacement));

    h.feed(10);
    assert_eq!(h.starts.get(), 0);
    assert_eq!(replacement.get(), 1);
}

#[test]
fn test_range_function_accepts_closure() {
    let mut tripwire = Tripwire::with_clock(
        TripwireConfig {
            min_baseline_reads: 1,
            ..TripwireConfig::default()
        },
        ManualClock::new(0),
        None,
    );
    tripwire.set_range_function(Some(Box::new(|| 42_i64)));

    assert!(tripwire.start().is_calibrated);
    assert_eq!(tripwire.baseline_distance(), 42);
}

#[test]
fn test_require_calibrated_before_any_calibration() {
    let source = ScriptedRange::constant(100);
    let tripwire = Tripwire::with_clock(
        TripwireConfig::default(),
        ManualClock::new(0),
        Some(Box::new(source)),
    );
    assert_eq!(tripwire.require_calibrated(), Err(CalibrationError::NotRun));
}

#[test]
fn test_skipped_calibration_reported_after_source_is_set() {
    let mut tripwire =
        Tripwire::with_clock(TripwireConfig::default(), ManualClock::new(0), None);
    tripwire.start();

    // Wiring a source later does not make the skipped run look unstable
    tripwire.set_range_function(Some(Box::new(ScriptedRange::constant(100))));
    assert_eq!(
        tripwire.require_calibrated(),
        Err(CalibrationError::NoRangeSource)
    );

    assert!(tripwire.calibrate().is_calibrated);
    assert_eq!(tripwire.require_calibrated(), Ok(()));
}

#[test]
fn test_skip_after_success_reports_threshold() {
    let mut h = harness(0);
    h.tripwire.config.distance_threshold = 0;
    h.tripwire.calibrate();

    assert_eq!(
        h.tripwire.require_calibrated(),
        Err(CalibrationError::ThresholdUnset)
    );
}
