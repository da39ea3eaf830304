// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Error code range: 1001-1004
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// Config file could not be read
    pub const READ_FAILED: i32 = 1001;

    /// Config file is not valid JSON for `TripwireConfig`
    pub const PARSE_FAILED: i32 = 1002;

    /// Baseline read bounds are inconsistent
    pub const INVALID_READ_BOUNDS: i32 = 1003;

    /// A threshold or variance ceiling is out of range
    pub const INVALID_THRESHOLD: i32 = 1004;
}

/// Log a configuration error with structured context
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=TripwireConfig, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration loading and validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Reading the file failed
    ReadFailed { path: String, reason: String },

    /// Deserializing the file failed
    ParseFailed { path: String, reason: String },

    /// `min_baseline_reads` / `max_baseline_reads` make no sense together
    InvalidReadBounds { min: u32, max: u32 },

    /// A threshold-type field holds an unusable value
    InvalidThreshold { field: &'static str, value: i64 },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::ReadFailed { .. } => ConfigErrorCodes::READ_FAILED,
            ConfigError::ParseFailed { .. } => ConfigErrorCodes::PARSE_FAILED,
            ConfigError::InvalidReadBounds { .. } => ConfigErrorCodes::INVALID_READ_BOUNDS,
            ConfigError::InvalidThreshold { .. } => ConfigErrorCodes::INVALID_THRESHOLD,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::ReadFailed { path, reason } => {
                format!("Failed to read {}: {}", path, reason)
            }
            ConfigError::ParseFailed { path, reason } => {
                format!("Failed to parse {}: {}", path, reason)
            }
            ConfigError::InvalidReadBounds { min, max } => format!(
                "Invalid baseline read bounds: min {} must be in 1..={}",
                min, max
            ),
            ConfigError::InvalidThreshold { field, value } => {
                format!("Invalid {}: {}", field, value)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
