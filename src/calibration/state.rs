// CalibrationState - background distance estimate for the tripwire
//
// The baseline is what the sensor reports when nothing is in the way. Its
// variance is a smoothed mean absolute deviation, not a statistical variance.

use crate::error::CalibrationError;

/// Result of the most recent calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct CalibrationState {
    /// Background range of the sensor. Units follow the range source.
    pub baseline_distance: i64,
    /// How much the baseline varied during calibration
    pub baseline_variance: i64,
    /// Whether the variance settled below the configured ceiling
    pub is_calibrated: bool,
    /// Number of readings the calibration consumed
    #[serde(default)]
    pub baseline_reads: u32,
}

impl CalibrationState {
    /// Uncalibrated state with a zero baseline
    pub fn new_default() -> Self {
        Self::default()
    }

    /// Convert the calibration flag into a `Result` for callers that want to
    /// refuse to run detection on an unstable baseline.
    pub fn require_calibrated(&self, max_baseline_variance: i64) -> Result<(), CalibrationError> {
        if self.is_calibrated {
            Ok(())
        } else {
            Err(CalibrationError::UnstableBaseline {
                variance: self.baseline_variance,
                max_variance: max_baseline_variance,
                reads: self.baseline_reads,
            })
        }
    }
}
