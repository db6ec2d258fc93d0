//! Neuron model declaration.
//!
//! A model carries its parameter set, a textual description of its
//! equations (for logging and inspection) and the numerical update the
//! engine calls once per step and neuron.

use coba_core::{Conductance, Time, Voltage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{EngineError, Result};

// ============================================================================
// EQUATION DESCRIPTION
// ============================================================================

/// Units used in equation descriptions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Unit {
    Millisecond,
    Millivolt,
    Dimensionless,
}

/// Differential equation: `tau * dvar/dt = expr`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferentialEquation {
    pub variable: String,
    pub expression: String,
    pub unit: Unit,
}

/// Threshold condition for spike generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdCondition {
    pub condition: String, // e.g., "v > Vt"
}

/// Reset equations after spike
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetEquations {
    pub equations: Vec<String>, // e.g., ["v = Vr"]
}

/// Integration methods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IntegrationMethod {
    Euler,
}

/// Complete neuron equations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuronEquations {
    pub differential: Vec<DifferentialEquation>,
    pub threshold: ThresholdCondition,
    pub reset: ResetEquations,
    /// Refractory duration (ms)
    pub refractory: Time,
    pub method: IntegrationMethod,
    pub parameters: BTreeMap<String, f64>,
}

// ============================================================================
// MODEL TRAIT
// ============================================================================

/// Per-neuron state of a conductance-based integrate-and-fire neuron
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeuronState {
    pub v: Voltage,
    pub g_exc: Conductance,
    pub g_inh: Conductance,
}

/// Numerical behaviour of a neuron type.
///
/// Implementations must be stateless: all per-neuron state lives in
/// [`NeuronState`] owned by the population, so one model instance is
/// shared across worker threads.
pub trait NeuronModel: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Refractory duration (ms)
    fn refractory(&self) -> Time;

    /// Advance `state` by one step of `dt` ms. While `refractory` is set the
    /// membrane potential is held and only the conductances evolve.
    fn integrate(&self, state: &mut NeuronState, dt: Time, refractory: bool);

    /// Spike condition
    fn threshold(&self, state: &NeuronState) -> bool;

    /// Reset applied right after a spike
    fn reset(&self, state: &mut NeuronState);

    fn to_equations(&self) -> NeuronEquations;
}

// ============================================================================
// CONDUCTANCE-BASED LIF (COBA)
// ============================================================================

/// Leaky integrate-and-fire neuron with exponentially decaying
/// excitatory and inhibitory conductances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CobaNeuron {
    pub el: Voltage,       // Leak potential (mV)
    pub vr: Voltage,       // Reset potential (mV)
    pub erev_exc: Voltage, // Excitatory reversal (mV)
    pub erev_inh: Voltage, // Inhibitory reversal (mV)
    pub vt: Voltage,       // Spike threshold (mV)
    pub tau: Time,         // Membrane time constant (ms)
    pub tau_exc: Time,     // Excitatory conductance decay (ms)
    pub tau_inh: Time,     // Inhibitory conductance decay (ms)
    pub i: f64,            // Constant input
    pub refractory: Time,  // Refractory period (ms)
}

impl Default for CobaNeuron {
    fn default() -> Self {
        Self {
            el: -60.0,
            vr: -60.0,
            erev_exc: 0.0,
            erev_inh: -80.0,
            vt: -50.0,
            tau: 20.0,
            tau_exc: 5.0,
            tau_inh: 10.0,
            i: 20.0,
            refractory: 5.0,
        }
    }
}

impl CobaNeuron {
    pub fn validate(&self) -> Result<()> {
        for (name, tau) in [("tau", self.tau), ("tau_exc", self.tau_exc), ("tau_inh", self.tau_inh)] {
            if !(tau.is_finite() && tau > 0.0) {
                return Err(EngineError::InvalidModel(format!(
                    "{} must be positive, got {}",
                    name, tau
                )));
            }
        }
        if !(self.refractory.is_finite() && self.refractory >= 0.0) {
            return Err(EngineError::InvalidModel(format!(
                "refractory must be non-negative, got {}",
                self.refractory
            )));
        }
        Ok(())
    }
}

impl NeuronModel for CobaNeuron {
    fn name(&self) -> &str {
        "COBA"
    }

    fn refractory(&self) -> Time {
        self.refractory
    }

    fn integrate(&self, state: &mut NeuronState, dt: Time, refractory: bool) {
        // Explicit Euler: every derivative is taken at the old state.
        let NeuronState { v, g_exc, g_inh } = *state;

        let dv = ((self.el - v)
            + g_exc * (self.erev_exc - v)
            + g_inh * (self.erev_inh - v)
            + self.i)
            / self.tau;
        let dg_exc = -g_exc / self.tau_exc;
        let dg_inh = -g_inh / self.tau_inh;

        if !refractory {
            state.v = v + dt * dv;
        }
        state.g_exc = g_exc + dt * dg_exc;
        state.g_inh = g_inh + dt * dg_inh;
    }

    fn threshold(&self, state: &NeuronState) -> bool {
        state.v > self.vt
    }

    fn reset(&self, state: &mut NeuronState) {
        state.v = self.vr;
    }

    fn to_equations(&self) -> NeuronEquations {
        let parameters = BTreeMap::from([
            ("El".to_string(), self.el),
            ("Vr".to_string(), self.vr),
            ("Erev_exc".to_string(), self.erev_exc),
            ("Erev_inh".to_string(), self.erev_inh),
            ("Vt".to_string(), self.vt),
            ("tau".to_string(), self.tau),
            ("tau_exc".to_string(), self.tau_exc),
            ("tau_inh".to_string(), self.tau_inh),
            ("I".to_string(), self.i),
        ]);

        NeuronEquations {
            differential: vec![
                DifferentialEquation {
                    variable: "v".into(),
                    expression: "tau * dv/dt = (El - v) + g_exc * (Erev_exc - v) + g_inh * (Erev_inh - v) + I".into(),
                    unit: Unit::Millivolt,
                },
                DifferentialEquation {
                    variable: "g_exc".into(),
                    expression: "tau_exc * dg_exc/dt = - g_exc".into(),
                    unit: Unit::Dimensionless,
                },
                DifferentialEquation {
                    variable: "g_inh".into(),
                    expression: "tau_inh * dg_inh/dt = - g_inh".into(),
                    unit: Unit::Dimensionless,
                },
            ],
            threshold: ThresholdCondition {
                condition: "v > Vt".into(),
            },
            reset: ResetEquations {
                equations: vec!["v = Vr".into()],
            },
            refractory: self.refractory,
            method: IntegrationMethod::Euler,
            parameters,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
