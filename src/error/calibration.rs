// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Error code range: 2001-2004
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// No range source was configured when calibration ran
    pub const NO_RANGE_SOURCE: i32 = 2001;

    /// Calibration was skipped because the distance threshold is zero
    pub const THRESHOLD_UNSET: i32 = 2002;

    /// Baseline variance never settled below the allowed ceiling
    pub const UNSTABLE_BASELINE: i32 = 2003;

    /// Calibration has not been run yet
    pub const NOT_RUN: i32 = 2004;
}

/// Log a calibration error with structured context
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=Calibration, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Reasons a tripwire is not calibrated
///
/// Error code range: 2001-2004
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    /// No range source was configured
    NoRangeSource,

    /// `distance_threshold` is zero, so calibration was skipped
    ThresholdUnset,

    /// Variance ended at or above the allowed ceiling
    UnstableBaseline {
        variance: i64,
        max_variance: i64,
        reads: u32,
    },

    /// Neither `start()` nor `calibrate()` has been called
    NotRun,
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::NoRangeSource => CalibrationErrorCodes::NO_RANGE_SOURCE,
            CalibrationError::ThresholdUnset => CalibrationErrorCodes::THRESHOLD_UNSET,
            CalibrationError::UnstableBaseline { .. } => CalibrationErrorCodes::UNSTABLE_BASELINE,
            CalibrationError::NotRun => CalibrationErrorCodes::NOT_RUN,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::NoRangeSource => "No range source configured".to_string(),
            CalibrationError::ThresholdUnset => {
                "Distance threshold is zero, calibration skipped".to_string()
            }
            CalibrationError::UnstableBaseline {
                variance,
                max_variance,
                reads,
            } => format!(
                "Baseline unstable: variance {} >= {} after {} reads",
                variance, max_variance, reads
            ),
            CalibrationError::NotRun => "Calibration has not been run".to_string(),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}
