// Calibration module - baseline estimation for the tripwire
//
// This module provides two main components:
// 1. CalibrationState: the baseline distance, its noise estimate and whether
//    the last calibration was accepted
// 2. CalibrationProcedure: the adaptive running-average sampling loop
//
// The calibration workflow:
// 1. Seed the procedure with one reading
// 2. Feed readings until the variance settles (bounded by min/max reads)
// 3. Finish to produce a CalibrationState

pub mod procedure;
pub mod state;

pub use procedure::CalibrationProcedure;
pub use state::CalibrationState;
