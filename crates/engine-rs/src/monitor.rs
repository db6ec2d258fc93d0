//! Spike recording.

use coba_core::{steps_to_ms, Step, Time};
use serde::{Deserialize, Serialize};

use crate::population::PopulationId;

/// Records spike times of every neuron in a population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpikeMonitor {
    pub population: PopulationId,
    /// Spike steps per neuron, in ascending order
    trains: Vec<Vec<Step>>,
}

impl SpikeMonitor {
    pub fn new(population: PopulationId, size: usize) -> Self {
        Self {
            population,
            trains: vec![Vec::new(); size],
        }
    }

    pub fn size(&self) -> usize {
        self.trains.len()
    }

    pub fn record_spike(&mut self, idx: usize, step: Step) {
        if let Some(train) = self.trains.get_mut(idx) {
            train.push(step);
        }
    }

    /// Spike steps of one neuron (empty for out-of-range indices)
    pub fn spikes(&self, idx: usize) -> &[Step] {
        self.trains.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All spike trains, indexed by neuron
    pub fn spike_trains(&self) -> &[Vec<Step>] {
        &self.trains
    }

    pub fn total_spikes(&self) -> usize {
        self.trains.iter().map(Vec::len).sum()
    }

    /// Flatten the trains into (times in ms, neuron indices), ordered by neuron
    pub fn raster_plot(&self, dt: Time) -> (Vec<Time>, Vec<usize>) {
        let mut times = Vec::with_capacity(self.total_spikes());
        let mut neurons = Vec::with_capacity(self.total_spikes());
        for (idx, train) in self.trains.iter().enumerate() {
            for &step in train {
                times.push(steps_to_ms(step, dt));
                neurons.push(idx);
            }
        }
        (times, neurons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spike_monitor() {
        let mut monitor = SpikeMonitor::new(PopulationId(0), 10);
        monitor.record_spike(0, 100);
        monitor.record_spike(0, 200);
        monitor.record_spike(1, 150);
        monitor.record_spike(42, 150);

        assert_eq!(monitor.spikes(0), &[100, 200]);
        assert_eq!(monitor.spikes(1), &[150]);
        assert!(monitor.spikes(99).is_empty());
        assert_eq!(monitor.total_spikes(), 3);
    }

    #[test]
    fn test_raster_plot() {
        let mut monitor = SpikeMonitor::new(PopulationId(0), 3);
        monitor.record_spike(2, 10);
        monitor.record_spike(0, 5);

        let (times, neurons) = monitor.raster_plot(0.1);
        assert_eq!(neurons, vec![0, 2]);
        assert!((times[0] - 0.5).abs() < 1e-12);
        assert!((times[1] - 1.0).abs() < 1e-12);
    }
}
