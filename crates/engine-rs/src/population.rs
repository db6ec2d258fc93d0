//! Populations of neurons sharing one model, and index-range views on them.

use coba_core::Time;
use ndarray::{Array1, ArrayViewMut1, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;

use crate::model::{NeuronModel, NeuronState};
use crate::projection::Target;
use crate::{EngineError, Result};

/// Handle of a population inside a [`Network`](crate::Network)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopulationId(pub usize);

/// Contiguous slice `start..end` of a population
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationView {
    pub population: PopulationId,
    pub start: usize,
    pub end: usize,
}

impl PopulationView {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Local index of a population-level index, if it falls in the view
    pub fn local_index(&self, global: usize) -> Option<usize> {
        self.range().contains(&global).then(|| global - self.start)
    }
}

/// A group of neurons sharing the same model
#[derive(Debug, Clone)]
pub struct Population {
    pub name: String,
    pub size: usize,
    model: Arc<dyn NeuronModel>,
    /// Membrane potential (mV)
    pub v: Array1<f64>,
    /// Excitatory conductance
    pub g_exc: Array1<f64>,
    /// Inhibitory conductance
    pub g_inh: Array1<f64>,
    /// Steps left in the refractory period
    refractory_remaining: Array1<u32>,
    spiked: Vec<bool>,
}

impl Population {
    pub fn new(name: &str, size: usize, model: Arc<dyn NeuronModel>) -> Self {
        Self {
            name: name.to_string(),
            size,
            model,
            v: Array1::zeros(size),
            g_exc: Array1::zeros(size),
            g_inh: Array1::zeros(size),
            refractory_remaining: Array1::zeros(size),
            spiked: vec![false; size],
        }
    }

    pub fn model(&self) -> &dyn NeuronModel {
        self.model.as_ref()
    }

    /// Set a state variable to the same value for every neuron
    pub fn set_initial(&mut self, variable: &str, value: f64) -> Result<()> {
        self.state_mut(variable)?.fill(value);
        Ok(())
    }

    pub fn state(&self, variable: &str) -> Result<&Array1<f64>> {
        match variable {
            "v" => Ok(&self.v),
            "g_exc" => Ok(&self.g_exc),
            "g_inh" => Ok(&self.g_inh),
            other => Err(EngineError::UnknownVariable(other.to_string())),
        }
    }

    pub fn state_mut(&mut self, variable: &str) -> Result<&mut Array1<f64>> {
        match variable {
            "v" => Ok(&mut self.v),
            "g_exc" => Ok(&mut self.g_exc),
            "g_inh" => Ok(&mut self.g_inh),
            other => Err(EngineError::UnknownVariable(other.to_string())),
        }
    }

    /// Conductance receiving input for a synaptic target
    pub fn conductance_mut(&mut self, target: Target) -> &mut Array1<f64> {
        match target {
            Target::Exc => &mut self.g_exc,
            Target::Inh => &mut self.g_inh,
        }
    }

    /// Whether neuron `idx` is currently refractory
    pub fn is_refractory(&self, idx: usize) -> bool {
        self.refractory_remaining.get(idx).is_some_and(|&r| r > 0)
    }

    /// View on `range` of this population
    pub fn view(&self, id: PopulationId, range: Range<usize>) -> Result<PopulationView> {
        if range.start > range.end || range.end > self.size {
            return Err(EngineError::InvalidView {
                population: self.name.clone(),
                start: range.start,
                end: range.end,
                size: self.size,
            });
        }
        Ok(PopulationView {
            population: id,
            start: range.start,
            end: range.end,
        })
    }

    /// Integrate all neurons by one step and return the indices that spiked,
    /// in ascending order.
    pub(crate) fn update(&mut self, dt: Time, refractory_steps: u32) -> Vec<usize> {
        let model = self.model.as_ref();

        Zip::from(&mut self.v)
            .and(&mut self.g_exc)
            .and(&mut self.g_inh)
            .and(&mut self.refractory_remaining)
            .and(ArrayViewMut1::from(self.spiked.as_mut_slice()))
            .par_for_each(|v, g_exc, g_inh, remaining, spiked| {
                let refractory = *remaining > 0;
                let mut state = NeuronState { v: *v, g_exc: *g_exc, g_inh: *g_inh };

                model.integrate(&mut state, dt, refractory);

                *spiked = false;
                if refractory {
                    *remaining -= 1;
                } else if model.threshold(&state) {
                    model.reset(&mut state);
                    *remaining = refractory_steps;
                    *spiked = true;
                }

                *v = state.v;
                *g_exc = state.g_exc;
                *g_inh = state.g_inh;
            });

        self.spiked
            .par_iter()
            .enumerate()
            .filter_map(|(idx, &spiked)| spiked.then_some(idx))
            .collect()
    }
}
