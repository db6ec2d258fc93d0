//! # COBA Core
//!
//! Shared types and utilities for the COBA benchmark workspace.
//!
//! ## Conventions
//!
//! | Quantity | Unit |
//! |----------|------|
//! | Time | ms |
//! | Voltage | mV |
//! | Conductance | dimensionless (relative to leak) |
//! | Current | mV (already divided by leak conductance) |
//!
//! Simulated time advances on a fixed grid of `dt` milliseconds; the
//! integer index on that grid is a [`Step`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common errors
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid timestep: {0} ms")]
    InvalidTimestep(f64),

    #[error("Invalid duration: {0} ms")]
    InvalidDuration(f64),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Time point (ms)
pub type Time = f64;

/// Voltage (mV)
pub type Voltage = f64;

/// Conductance
pub type Conductance = f64;

/// Index on the simulation time grid
pub type Step = u64;

/// Milliseconds per second
pub const MS_PER_SECOND: f64 = 1000.0;

/// Convert a duration in seconds to milliseconds
pub fn seconds_to_ms(seconds: f64) -> Time {
    seconds * MS_PER_SECOND
}

/// Simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Time step (ms)
    pub dt: Time,
    /// Total simulated duration (ms)
    pub duration: Time,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            dt: 0.1,
            duration: 1000.0,
        }
    }
}

impl SimulationParams {
    pub fn new(dt: Time, duration: Time) -> Result<Self> {
        let params = Self { dt, duration };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(CoreError::InvalidTimestep(self.dt));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(CoreError::InvalidDuration(self.duration));
        }
        Ok(())
    }

    /// Number of grid steps covering the duration
    pub fn num_steps(&self) -> Step {
        ms_to_steps(self.duration, self.dt)
    }
}

/// Number of whole steps in `duration` ms, rounded to the nearest step.
///
/// Rounding (rather than truncation) keeps `1000.0 / 0.1` at exactly
/// 10 000 steps despite floating-point error.
pub fn ms_to_steps(duration: Time, dt: Time) -> Step {
    if duration <= 0.0 || dt <= 0.0 {
        return 0;
    }
    (duration / dt).round() as Step
}

/// Time (ms) at the start of a given step
pub fn steps_to_ms(step: Step, dt: Time) -> Time {
    step as f64 * dt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = SimulationParams::default();
        assert_eq!(params.num_steps(), 10_000);
    }

    #[test]
    fn test_ms_to_steps_rounding() {
        assert_eq!(ms_to_steps(5.0, 0.1), 50);
        assert_eq!(ms_to_steps(0.3, 0.1), 3);
        assert_eq!(ms_to_steps(0.0, 0.1), 0);
        assert_eq!(ms_to_steps(-1.0, 0.1), 0);
    }

    #[test]
    fn test_invalid_params() {
        assert!(SimulationParams::new(0.0, 100.0).is_err());
        assert!(SimulationParams::new(0.1, f64::NAN).is_err());
        assert!(SimulationParams::new(0.1, 0.0).is_ok());
    }

    #[test]
    fn test_seconds_to_ms() {
        assert_eq!(seconds_to_ms(1.0), 1000.0);
        assert!((steps_to_ms(25, 0.1) - 2.5).abs() < 1e-12);
    }
}
