// Tripwire - line-of-sight detection for ranging sensors
// Adaptive baseline calibration plus a debounced detection state machine

// Module declarations
pub mod calibration;
pub mod config;
pub mod detection;
pub mod error;
pub mod hal;
pub mod simulation;
pub mod testing;
pub mod tripwire;

// Re-exports for convenience
pub use calibration::{CalibrationProcedure, CalibrationState};
pub use config::TripwireConfig;
pub use detection::{DetectionEvent, DetectionPhase};
pub use hal::{Clock, RangeSource, SystemClock};
pub use tripwire::{EventCallback, Tripwire};
