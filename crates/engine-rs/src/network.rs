//! Network assembly, compilation and the simulation loop.

use coba_core::{ms_to_steps, steps_to_ms, CoreError, SimulationParams, Step, Time};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::monitor::SpikeMonitor;
use crate::population::{Population, PopulationId, PopulationView};
use crate::projection::Projection;
use crate::{EngineError, Result};

/// Handle of a spike monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorId(pub usize);

// ============================================================================
// NETWORK (declaration)
// ============================================================================

/// Declared but not yet compiled network
#[derive(Debug)]
pub struct Network {
    pub dt: Time,
    populations: Vec<Population>,
    projections: Vec<Projection>,
    monitors: Vec<SpikeMonitor>,
}

impl Network {
    pub fn new(dt: Time) -> Self {
        Self {
            dt,
            populations: Vec::new(),
            projections: Vec::new(),
            monitors: Vec::new(),
        }
    }

    pub fn add_population(&mut self, population: Population) -> PopulationId {
        self.populations.push(population);
        PopulationId(self.populations.len() - 1)
    }

    pub fn population(&self, id: PopulationId) -> Result<&Population> {
        self.populations
            .get(id.0)
            .ok_or(EngineError::UnknownPopulation(id.0))
    }

    pub fn population_mut(&mut self, id: PopulationId) -> Result<&mut Population> {
        self.populations
            .get_mut(id.0)
            .ok_or(EngineError::UnknownPopulation(id.0))
    }

    /// Sub-population `range` of population `id`
    pub fn view(&self, id: PopulationId, range: Range<usize>) -> Result<PopulationView> {
        self.population(id)?.view(id, range)
    }

    pub fn add_projection(&mut self, projection: Projection) -> Result<()> {
        for view in [&projection.pre, &projection.post] {
            // Re-validates views built against another network
            self.view(view.population, view.range())?;
        }
        self.projections.push(projection);
        Ok(())
    }

    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    /// Record spikes of every neuron in population `id`
    pub fn monitor_spikes(&mut self, id: PopulationId) -> Result<MonitorId> {
        let size = self.population(id)?.size;
        self.monitors.push(SpikeMonitor::new(id, size));
        Ok(MonitorId(self.monitors.len() - 1))
    }

    /// Validate the declaration and freeze it into a runnable simulation
    pub fn compile(self) -> Result<Simulation> {
        SimulationParams::new(self.dt, 0.0)?;

        for projection in &self.projections {
            if !projection.is_connected() {
                return Err(EngineError::NotConnected(projection.name.clone()));
            }
        }

        let refractory_steps = self
            .populations
            .iter()
            .map(|p| ms_to_steps(p.model().refractory(), self.dt) as u32)
            .collect();

        for population in &self.populations {
            if let Ok(json) = serde_json::to_string(&population.model().to_equations()) {
                debug!(population = %population.name, model = %json, "neuron model");
            }
        }

        let neurons: usize = self.populations.iter().map(|p| p.size).sum();
        let synapses: usize = self.projections.iter().map(Projection::nb_synapses).sum();
        info!(
            populations = self.populations.len(),
            neurons,
            projections = self.projections.len(),
            synapses,
            dt = self.dt,
            "network compiled"
        );

        let last_spikes = vec![Vec::new(); self.populations.len()];
        Ok(Simulation {
            dt: self.dt,
            current_step: 0,
            populations: self.populations,
            projections: self.projections,
            monitors: self.monitors,
            refractory_steps,
            last_spikes,
        })
    }
}

// ============================================================================
// SIMULATION (compiled)
// ============================================================================

/// Outcome of one `simulate` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub steps: Step,
    /// Simulated time (ms)
    pub simulated: Time,
    /// Wall-clock time spent stepping
    pub elapsed: Duration,
}

/// Compiled network, advanced on a fixed time grid
#[derive(Debug)]
pub struct Simulation {
    dt: Time,
    current_step: Step,
    populations: Vec<Population>,
    projections: Vec<Projection>,
    monitors: Vec<SpikeMonitor>,
    refractory_steps: Vec<u32>,
    /// Spikes emitted during the previous step, per population
    last_spikes: Vec<Vec<usize>>,
}

impl Simulation {
    pub fn dt(&self) -> Time {
        self.dt
    }

    pub fn current_step(&self) -> Step {
        self.current_step
    }

    /// Current simulated time (ms)
    pub fn time(&self) -> Time {
        steps_to_ms(self.current_step, self.dt)
    }

    pub fn population(&self, id: PopulationId) -> Result<&Population> {
        self.populations
            .get(id.0)
            .ok_or(EngineError::UnknownPopulation(id.0))
    }

    pub fn monitor(&self, id: MonitorId) -> Option<&SpikeMonitor> {
        self.monitors.get(id.0)
    }

    /// Run for `duration` ms
    pub fn simulate(&mut self, duration: Time) -> Result<SimulationReport> {
        self.simulate_with(duration, |_| {})
    }

    /// Run for `duration` ms, calling `on_step` with the number of steps
    /// completed so far in this call after each step.
    pub fn simulate_with<F>(&mut self, duration: Time, mut on_step: F) -> Result<SimulationReport>
    where
        F: FnMut(Step),
    {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(CoreError::InvalidDuration(duration).into());
        }

        let steps = ms_to_steps(duration, self.dt);
        let start = Instant::now();
        for done in 1..=steps {
            self.step();
            on_step(done);
        }
        let elapsed = start.elapsed();

        info!(
            "Simulating {} ms took {:.6} seconds ({} steps)",
            duration,
            elapsed.as_secs_f64(),
            steps
        );

        Ok(SimulationReport {
            steps,
            simulated: steps_to_ms(steps, self.dt),
            elapsed,
        })
    }

    fn step(&mut self) {
        // Spike propagation from the previous step
        for projection in &self.projections {
            let spikes = &self.last_spikes[projection.pre.population.0];
            if spikes.is_empty() {
                continue;
            }
            let post = &mut self.populations[projection.post.population.0];
            let g = post.conductance_mut(projection.target);
            for &idx in spikes {
                if let Some(pre_local) = projection.pre.local_index(idx) {
                    for (post_local, weight) in projection.efferents(pre_local) {
                        g[projection.post.start + post_local] += weight;
                    }
                }
            }
        }

        // Neuron update
        for (id, population) in self.populations.iter_mut().enumerate() {
            self.last_spikes[id] = population.update(self.dt, self.refractory_steps[id]);
        }

        // Recording
        for monitor in &mut self.monitors {
            for &idx in &self.last_spikes[monitor.population.0] {
                monitor.record_spike(idx, self.current_step);
            }
        }

        self.current_step += 1;
    }
}

// ============================================================================
// TESTS
// ============================================================================
