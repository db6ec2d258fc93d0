//! Synaptic delay derived from the timestep bounds on the command line.

use coba_core::Time;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Delay in ms, either fixed or drawn uniformly per synapse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SynapticDelay {
    Fixed(Time),
    Uniform { low: Time, high: Time },
}

impl SynapticDelay {
    /// Fixed at `min_steps * dt` when both bounds agree, uniform over
    /// `[min_steps * dt, max_steps * dt]` otherwise.
    pub fn derive(min_steps: u32, max_steps: u32, dt: Time) -> Self {
        let (lo, hi) = (min_steps.min(max_steps), min_steps.max(max_steps));
        if lo == hi {
            SynapticDelay::Fixed(lo as f64 * dt)
        } else {
            SynapticDelay::Uniform {
                low: lo as f64 * dt,
                high: hi as f64 * dt,
            }
        }
    }

    pub fn bounds(&self) -> (Time, Time) {
        match *self {
            SynapticDelay::Fixed(d) => (d, d),
            SynapticDelay::Uniform { low, high } => (low, high),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Time {
        match *self {
            SynapticDelay::Fixed(d) => d,
            SynapticDelay::Uniform { low, high } => Uniform::new_inclusive(low, high).sample(rng),
        }
    }
}
