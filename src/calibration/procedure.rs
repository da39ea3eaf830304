// CalibrationProcedure - adaptive baseline sampling
//
// The procedure keeps a running average of the readings and a running
// average of how far each reading lands from the baseline (both smoothed by
// halving). It always takes `min_reads` samples, keeps sampling while the
// variance is above the ceiling, and stops at `max_reads` regardless.

use crate::calibration::state::CalibrationState;
use crate::config::TripwireConfig;
use crate::hal::{Clock, RangeSource};

/// Adaptive baseline sampling loop
#[derive(Debug, Clone)]
pub struct CalibrationProcedure {
    baseline_distance: i64,
    baseline_variance: i64,
    reads: u32,
    min_reads: u32,
    max_reads: u32,
    max_variance: i64,
}

impl CalibrationProcedure {
    /// Start a procedure from its first reading.
    ///
    /// The variance is seeded with the magnitude of the first reading rather
    /// than a measured deviation, so a sensor reporting large absolute
    /// distances starts far above any sensible ceiling and needs several
    /// halvings before it can pass.
    pub fn new(first_reading: i64, config: &TripwireConfig) -> Self {
        Self {
            baseline_distance: first_reading,
            baseline_variance: first_reading.abs(),
            reads: 1,
            min_reads: config.min_baseline_reads,
            max_reads: config.max_baseline_reads,
            max_variance: config.max_baseline_variance,
        }
    }

    /// Whether another reading should be taken
    pub fn needs_more(&self) -> bool {
        (self.reads < self.min_reads || self.baseline_variance > self.max_variance)
            && self.reads < self.max_reads
    }

    /// Fold one reading into the running estimates
    pub fn add_sample(&mut self, reading: i64) {
        let deviation = (self.baseline_distance - reading).abs();

        self.baseline_variance = (self.baseline_variance + deviation) / 2;
        self.baseline_distance = (self.baseline_distance + reading) / 2;
        self.reads += 1;

        log::trace!(
            "[Calibration] read {} reading={} deviation={} baseline={} variance={}",
            self.reads,
            reading,
            deviation,
            self.baseline_distance,
            self.baseline_variance
        );
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }

    pub fn baseline_distance(&self) -> i64 {
        self.baseline_distance
    }

    pub fn baseline_variance(&self) -> i64 {
        self.baseline_variance
    }

    /// Finalize into a CalibrationState
    ///
    /// Calibration is accepted only if the variance is strictly below the
    /// ceiling, regardless of how the loop ended.
    pub fn finish(&self) -> CalibrationState {
        CalibrationState {
            baseline_distance: self.baseline_distance,
            baseline_variance: self.baseline_variance,
            is_calibrated: self.baseline_variance < self.max_variance,
            baseline_reads: self.reads,
        }
    }

    /// Run a full calibration against a live source.
    ///
    /// Blocks on `clock` for `baseline_read_interval` after every reading
    /// past the first.
    pub fn run(
        source: &mut dyn RangeSource,
        clock: &dyn Clock,
        config: &TripwireConfig,
    ) -> CalibrationState {
        let mut procedure = Self::new(source.read_range(), config);

        while procedure.needs_more() {
            let reading = source.read_range();
            procedure.add_sample(reading);
            clock.sleep_ms(config.baseline_read_interval);
        }

        procedure.finish()
    }
}

#[cfg(test)]
#[path = "procedure_tests.rs"]
mod procedure_tests;
