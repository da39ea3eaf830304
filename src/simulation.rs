//! Offline replay of recorded or synthetic range traces.
//!
//! A trace is a flat list of readings. Calibration consumes readings from
//! the front until it is satisfied; every remaining reading drives one
//! `update()` call on a manual clock that advances by a fixed poll interval.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationState;
use crate::config::TripwireConfig;
use crate::detection::DetectionEvent;
use crate::testing::{ManualClock, ScriptedRange};
use crate::tripwire::Tripwire;

/// Default simulated polling cadence [ms]
pub const DEFAULT_POLL_MS: u64 = 20;

/// One detection run as seen by the replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Confirmation time; `None` for runs that ended before confirming
    pub start_ms: Option<u64>,
    /// `None` while the event is still active at the end of the trace
    pub end_ms: Option<u64>,
    pub width_ms: Option<u64>,
    pub confirmed: bool,
}

/// Outcome of a replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub config: TripwireConfig,
    pub calibration: CalibrationState,
    /// Calibration read past the end of the trace and reused its last reading
    pub calibration_exhausted_trace: bool,
    pub updates: usize,
    pub num_detections: u64,
    pub unmatched_ends: usize,
    pub events: Vec<EventRecord>,
}

/// Run `trace` through a fresh tripwire.
pub fn replay(trace: &[i64], config: TripwireConfig, poll_ms: u64) -> ReplayReport {
    let source = ScriptedRange::new(trace.iter().copied());
    let clock = ManualClock::new(0);
    let mut tripwire = Tripwire::with_clock(config, clock.clone(), Some(Box::new(source.clone())));

    let calibration = tripwire.start();
    let calibration_exhausted_trace = source.reads() as usize > trace.len();
    if calibration_exhausted_trace {
        log::warn!(
            "[Simulation] Calibration needed {} readings but the trace has {}",
            source.reads(),
            trace.len()
        );
    }
    let mut events: Vec<EventRecord> = Vec::new();
    let mut updates = 0;

    while source.remaining() > 0 {
        clock.advance(poll_ms);
        updates += 1;
        match tripwire.update() {
            Some(DetectionEvent::Started { at_ms }) => events.push(EventRecord {
                start_ms: Some(at_ms),
                end_ms: None,
                width_ms: None,
                confirmed: true,
            }),
            Some(DetectionEvent::Ended {
                at_ms,
                width_ms,
                confirmed,
            }) => match events.last_mut() {
                Some(open) if confirmed && open.end_ms.is_none() => {
                    open.end_ms = Some(at_ms);
                    open.width_ms = Some(width_ms);
                }
                _ => events.push(EventRecord {
                    start_ms: None,
                    end_ms: Some(at_ms),
                    width_ms: Some(width_ms),
                    confirmed,
                }),
            },
            None => {}
        }
    }

    let unmatched_ends = events.iter().filter(|event| !event.confirmed).count();
    log::info!(
        "[Simulation] Replayed {} updates: {} detections, {} unmatched ends",
        updates,
        tripwire.num_detections(),
        unmatched_ends
    );

    ReplayReport {
        config: tripwire.config.clone(),
        calibration,
        calibration_exhausted_trace,
        updates,
        num_detections: tripwire.num_detections(),
        unmatched_ends,
        events,
    }
}

/// Parameters for a synthetic trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthSpec {
    /// Distance to the background
    pub baseline: i64,
    /// Readings jitter uniformly within `±noise`
    pub noise: i64,
    /// How far an object sits in front of the background
    pub depth: i64,
    pub crossings: usize,
    /// Still readings at the start, for calibration
    pub lead_in: usize,
    /// Still readings between crossings
    pub gap: usize,
    /// Readings per crossing
    pub crossing_len: usize,
}

impl Default for SynthSpec {
    fn default() -> Self {
        Self {
            baseline: 200,
            noise: 5,
            depth: 120,
            crossings: 3,
            lead_in: 40,
            gap: 25,
            crossing_len: 8,
        }
    }
}

/// Generate a noisy trace with `spec.crossings` objects passing through.
pub fn synthesize<R: Rng>(spec: &SynthSpec, rng: &mut R) -> Vec<i64> {
    let mut jitter = |level: i64| {
        if spec.noise > 0 {
            level + rng.gen_range(-spec.noise..=spec.noise)
        } else {
            level
        }
    };
    let near = spec.baseline - spec.depth;

    let mut trace = Vec::with_capacity(
        spec.lead_in + spec.crossings * (spec.crossing_len + spec.gap),
    );
    trace.extend((0..spec.lead_in).map(|_| jitter(spec.baseline)));
    for _ in 0..spec.crossings {
        trace.extend((0..spec.crossing_len).map(|_| jitter(near)));
        trace.extend((0..spec.gap).map(|_| jitter(spec.baseline)));
    }
    trace
}
