//! Benchmark configuration.

use coba_core::{seconds_to_ms, Time};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::args::BenchArgs;
use crate::delay::SynapticDelay;

/// Total number of neurons
pub const NB_NEURONS: usize = 4000;

/// Excitatory neurons occupy indices `0..NB_EXC`, inhibitory the rest
pub const NB_EXC: usize = 3200;

/// Integration timestep (ms)
pub const TIMESTEP: Time = 0.1;

/// Written in fast mode
pub const TIME_FILE: &str = "timefile.dat";

/// Written in monitored mode
pub const SPIKES_FILE: &str = "spikes.out";

/// Everything a benchmark run needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Simulated duration (s)
    pub simtime: f64,
    pub fast: bool,
    pub num_timesteps_min_delay: u32,
    pub num_timesteps_max_delay: u32,
    /// Timestep (ms)
    pub dt: Time,
    /// Directory holding `ee.wmat`, `ei.wmat`, `ie.wmat`, `ii.wmat`
    pub data_dir: PathBuf,
    /// Directory receiving `timefile.dat` / `spikes.out`
    pub output_dir: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::from_args(&BenchArgs::default())
    }
}

impl BenchConfig {
    pub fn from_args(args: &BenchArgs) -> Self {
        Self {
            simtime: args.simtime,
            fast: args.fast,
            num_timesteps_min_delay: args.num_timesteps_min_delay,
            num_timesteps_max_delay: args.num_timesteps_max_delay,
            dt: TIMESTEP,
            data_dir: PathBuf::from(".."),
            output_dir: PathBuf::from("."),
        }
    }

    pub fn with_dirs(mut self, data_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self.output_dir = output_dir.as_ref().to_path_buf();
        self
    }

    /// Simulated duration (ms)
    pub fn duration_ms(&self) -> Time {
        seconds_to_ms(self.simtime)
    }

    pub fn delay(&self) -> SynapticDelay {
        SynapticDelay::derive(self.num_timesteps_min_delay, self.num_timesteps_max_delay, self.dt)
    }

    /// Path of the weight matrix `<name>.wmat`
    pub fn matrix_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.wmat", name))
    }
}
