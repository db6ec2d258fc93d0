//! # COBA Engine: spiking network simulation backend
//!
//! A small clock-driven engine in the style of equation-based simulators:
//! - Neuron model declaration (parameters, equations, threshold, reset, refractory)
//! - Populations and index-range views
//! - Projections built from sparse weight matrices (Matrix Market)
//! - Spike monitors
//! - Compile-then-simulate lifecycle on a fixed time grid

use coba_core::CoreError;
use thiserror::Error;

pub mod model;
pub mod monitor;
pub mod network;
pub mod population;
pub mod projection;
pub mod sparse;

pub use model::{CobaNeuron, NeuronEquations, NeuronModel, NeuronState};
pub use monitor::SpikeMonitor;
pub use network::{MonitorId, Network, Simulation, SimulationReport};
pub use population::{Population, PopulationId, PopulationView};
pub use projection::{Projection, Target};
pub use sparse::{load_matrix_market, parse_matrix_market};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Unknown population: {0}")]
    UnknownPopulation(usize),
    #[error("View {start}..{end} out of bounds for population '{population}' of size {size}")]
    InvalidView {
        population: String,
        start: usize,
        end: usize,
        size: usize,
    },
    #[error("Failed to read sparse matrix {path}: {message}")]
    MatrixMarket { path: String, message: String },
    #[error("Projection '{projection}' expects a {expected:?} matrix, got {got:?}")]
    ShapeMismatch {
        projection: String,
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("Projection '{0}' has no connectivity")]
    NotConnected(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
