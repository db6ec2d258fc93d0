//! Projections: directed sparse connectivity between population views.

use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::population::PopulationView;
use crate::{EngineError, Result};

/// Synaptic channel a projection feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Exc,
    Inh,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Exc => write!(f, "exc"),
            Target::Inh => write!(f, "inh"),
        }
    }
}

/// Connections from a pre-synaptic view to a post-synaptic view.
///
/// Weights are held as a CSR matrix with one row per pre-synaptic neuron;
/// a spike of pre neuron `i` adds `w[i, j]` to the target conductance of
/// post neuron `j`. Spikes are delivered on the step after emission.
#[derive(Debug, Clone)]
pub struct Projection {
    pub name: String,
    pub pre: PopulationView,
    pub post: PopulationView,
    pub target: Target,
    weights: Option<CsrMatrix<f64>>,
}

impl Projection {
    pub fn new(name: &str, pre: PopulationView, post: PopulationView, target: Target) -> Self {
        Self {
            name: name.to_string(),
            pre,
            post,
            target,
            weights: None,
        }
    }

    /// Use a sparse matrix of shape (pre, post) as connectivity and weights
    pub fn connect_from_sparse(&mut self, matrix: CsrMatrix<f64>) -> Result<()> {
        let expected = (self.pre.len(), self.post.len());
        let got = (matrix.nrows(), matrix.ncols());
        if expected != got {
            return Err(EngineError::ShapeMismatch {
                projection: self.name.clone(),
                expected,
                got,
            });
        }
        self.weights = Some(matrix);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.weights.is_some()
    }

    pub fn nb_synapses(&self) -> usize {
        self.weights.as_ref().map_or(0, |w| w.nnz())
    }

    pub fn weights(&self) -> Option<&CsrMatrix<f64>> {
        self.weights.as_ref()
    }

    /// Outgoing (post local index, weight) pairs of a pre-synaptic neuron
    pub(crate) fn efferents(&self, pre_local: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.weights.iter().flat_map(move |w| {
            let offsets = w.row_offsets();
            let (start, end) = if pre_local < w.nrows() {
                (offsets[pre_local], offsets[pre_local + 1])
            } else {
                (0, 0)
            };
            w.col_indices()[start..end]
                .iter()
                .copied()
                .zip(w.values()[start..end].iter().copied())
        })
    }
}
