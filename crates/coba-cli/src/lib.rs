//! # COBA benchmark
//!
//! Vogels-Abbott balanced network of 4000 conductance-based LIF neurons
//! (3200 excitatory, 800 inhibitory) wired by four sparse weight matrices.
//! A run either times the simulation (`--fast`) or records spikes and
//! reports the mean firing rate.

use coba_engine::EngineError;
use thiserror::Error;

pub mod args;
pub mod bench;
pub mod config;
pub mod delay;
pub mod output;

pub use args::{ArgsError, BenchArgs};
pub use bench::{build_network, run, BenchOutcome};
pub use config::BenchConfig;
pub use delay::SynapticDelay;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Spike monitor missing after compilation")]
    MissingMonitor,
}

pub type Result<T> = std::result::Result<T, BenchError>;
