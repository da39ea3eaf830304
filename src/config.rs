//! Detector configuration
//!
//! `TripwireConfig` holds every tunable the detector reads. Defaults match the
//! values the detector has always shipped with; JSON files may override any
//! subset of fields.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{log_config_error, ConfigError};

/// Default threshold distance [implied cm]
pub const DEFAULT_DISTANCE_THRESHOLD: i64 = 70;
/// Default minimum number of baseline reads for calibration
pub const DEFAULT_MIN_BASELINE_READS: u32 = 20;
/// Default maximum number of baseline reads for calibration
pub const DEFAULT_MAX_BASELINE_READS: u32 = 40;
/// Default maximum allowed variance in the baseline reading [cm]
pub const DEFAULT_MAX_BASELINE_VARIANCE: i64 = DEFAULT_DISTANCE_THRESHOLD;
/// Default time between sensor reads during calibration [ms]
pub const DEFAULT_BASELINE_READ_INTERVAL: u64 = 100;
/// Default number of successive detections before an event is confirmed
pub const DEFAULT_MIN_SUCCESSIVE_DETECTIONS: u32 = 0;

/// Tunable parameters for calibration and detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripwireConfig {
    /// Reduction from baseline that counts as a detection. Units follow the
    /// range source. Zero disables calibration.
    pub distance_threshold: i64,
    /// Calibration always takes at least this many reads
    pub min_baseline_reads: u32,
    /// Calibration never takes more than this many reads
    pub max_baseline_reads: u32,
    /// Calibration fails unless the final variance is strictly below this
    pub max_baseline_variance: i64,
    /// Delay between calibration reads [ms]
    pub baseline_read_interval: u64,
    /// Consecutive detections needed before an event starts
    pub min_successive_detections: u32,
    /// Only report an event end for events whose start was confirmed
    pub strict_event_pairing: bool,
}

impl Default for TripwireConfig {
    fn default() -> Self {
        Self {
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            min_baseline_reads: DEFAULT_MIN_BASELINE_READS,
            max_baseline_reads: DEFAULT_MAX_BASELINE_READS,
            max_baseline_variance: DEFAULT_MAX_BASELINE_VARIANCE,
            baseline_read_interval: DEFAULT_BASELINE_READ_INTERVAL,
            min_successive_detections: DEFAULT_MIN_SUCCESSIVE_DETECTIONS,
            strict_event_pairing: false,
        }
    }
}

impl TripwireConfig {
    /// Check the configuration for combinations that cannot work.
    ///
    /// The detector does not call this itself; it runs with whatever it is
    /// given. Hosts that load configs from disk should.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.distance_threshold <= 0 {
            return Err(ConfigError::InvalidThreshold {
                field: "distance_threshold",
                value: self.distance_threshold,
            });
        }
        if self.max_baseline_variance < 0 {
            return Err(ConfigError::InvalidThreshold {
                field: "max_baseline_variance",
                value: self.max_baseline_variance,
            });
        }
        if self.min_baseline_reads == 0 || self.min_baseline_reads > self.max_baseline_reads {
            return Err(ConfigError::InvalidReadBounds {
                min: self.min_baseline_reads,
                max: self.max_baseline_reads,
            });
        }
        Ok(())
    }

    /// Load configuration from a JSON file, failing on any problem.
    pub fn try_load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let display = path.as_ref().display().to_string();
        let contents = fs::read_to_string(&path).map_err(|err| ConfigError::ReadFailed {
            path: display.clone(),
            reason: err.to_string(),
        })?;
        let config: Self =
            serde_json::from_str(&contents).map_err(|err| ConfigError::ParseFailed {
                path: display.clone(),
                reason: err.to_string(),
            })?;
        log::info!("[Config] Loaded configuration from {}", display);
        Ok(config)
    }

    /// Load configuration from a JSON file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// invalid. Failures are logged.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                log_config_error(&err, "TripwireConfig::load_from_file");
                log::warn!("[Config] Using defaults.");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TripwireConfig::default();
        assert_eq!(config.distance_threshold, 70);
        assert_eq!(config.min_baseline_reads, 20);
        assert_eq!(config.max_baseline_reads, 40);
        assert_eq!(config.max_baseline_variance, config.distance_threshold);
        assert_eq!(config.baseline_read_interval, 100);
        assert_eq!(config.min_successive_detections, 0);
        assert!(!config.strict_event_pairing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let parsed: TripwireConfig =
            serde_json::from_str(r#"{"distance_threshold": 25, "min_successive_detections": 3}"#)
                .unwrap();
        assert_eq!(parsed.distance_threshold, 25);
        assert_eq!(parsed.min_successive_detections, 3);
        assert_eq!(parsed.max_baseline_reads, DEFAULT_MAX_BASELINE_READS);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = TripwireConfig {
            distance_threshold: 0,
            ..TripwireConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold {
                field: "distance_threshold",
                ..
            })
        ));

        let config = TripwireConfig {
            min_baseline_reads: 50,
            max_baseline_reads: 40,
            ..TripwireConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidReadBounds { min: 50, max: 40 })
        );

        let config = TripwireConfig {
            max_baseline_variance: -1,
            ..TripwireConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_at_least_one_baseline_read() {
        let config = TripwireConfig {
            min_baseline_reads: 0,
            ..TripwireConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidReadBounds { min: 0, max: 40 })
        );

        let config = TripwireConfig {
            min_baseline_reads: 1,
            max_baseline_reads: 1,
            ..TripwireConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_missing_file_falls_back() {
        let path = std::env::temp_dir().join(format!(
            "tripwire-missing-{}.json",
            std::process::id()
        ));
        assert!(matches!(
            TripwireConfig::try_load_from_file(&path),
            Err(ConfigError::ReadFailed { .. })
        ));
        assert_eq!(TripwireConfig::load_from_file(&path), TripwireConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "tripwire-config-{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{"baseline_read_interval": 5, "strict_event_pairing": true}"#)
            .unwrap();
        let config = TripwireConfig::try_load_from_file(&path).unwrap();
        assert_eq!(config.baseline_read_interval, 5);
        assert!(config.strict_event_pairing);
        let _ = fs::remove_file(&path);

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            TripwireConfig::try_load_from_file(&path),
            Err(ConfigError::ParseFailed { .. })
        ));
        let _ = fs::remove_file(&path);
    }
}
