// Error types for the tripwire detector
//
// The detection loop itself never returns errors: failures surface as state
// flags. These types serve callers that want a `Result` at the edges, such as
// configuration loading and "refuse to run uncalibrated" checks.

mod calibration;
mod config;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use config::{log_config_error, ConfigError, ConfigErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types so hosts can report them uniformly.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
