//! Network assembly and the two run modes.

use coba_engine::{
    load_matrix_market, CobaNeuron, Network, Population, PopulationId, PopulationView, Projection,
    Target,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::{BenchConfig, NB_EXC, NB_NEURONS};
use crate::output::{write_spikes, write_timefile};
use crate::{BenchError, Result};

/// Sub-population a projection endpoint refers to
#[derive(Debug, Clone, Copy)]
enum Side {
    Exc,
    Inh,
}

struct ProjectionSpec {
    name: &'static str,
    file: &'static str,
    pre: Side,
    post: Side,
    target: Target,
}

const PROJECTIONS: [ProjectionSpec; 4] = [
    ProjectionSpec { name: "Cee", file: "ee", pre: Side::Exc, post: Side::Exc, target: Target::Exc },
    ProjectionSpec { name: "Cei", file: "ei", pre: Side::Exc, post: Side::Inh, target: Target::Exc },
    ProjectionSpec { name: "Cie", file: "ie", pre: Side::Inh, post: Side::Exc, target: Target::Inh },
    ProjectionSpec { name: "Cii", file: "ii", pre: Side::Inh, post: Side::Inh, target: Target::Inh },
];

/// The declared COBA network and its handles
#[derive(Debug)]
pub struct CobaNetwork {
    pub network: Network,
    pub population: PopulationId,
    pub exc: PopulationView,
    pub inh: PopulationView,
}

impl CobaNetwork {
    fn view(&self, side: Side) -> PopulationView {
        match side {
            Side::Exc => self.exc.clone(),
            Side::Inh => self.inh.clone(),
        }
    }
}

/// Result of a benchmark run
#[derive(Debug, Clone, PartialEq)]
pub enum BenchOutcome {
    Timed {
        seconds: f64,
        path: PathBuf,
    },
    Monitored {
        total_spikes: usize,
        written_spikes: usize,
        mean_rate: f64,
        path: PathBuf,
    },
}

/// Declare the model, the 4000-neuron population with its E/I views and
/// the four projections loaded from `<data_dir>/{ee,ei,ie,ii}.wmat`.
pub fn build_network(config: &BenchConfig) -> Result<CobaNetwork> {
    let model = CobaNeuron::default();
    model.validate()?;

    let mut network = Network::new(config.dt);
    let mut population = Population::new("P", NB_NEURONS, Arc::new(model));
    population.set_initial("v", -55.0)?;
    population.set_initial("g_exc", 0.0)?;
    population.set_initial("g_inh", 0.0)?;
    let id = network.add_population(population);

    let exc = network.view(id, 0..NB_EXC)?;
    let inh = network.view(id, NB_EXC..NB_NEURONS)?;
    let mut coba = CobaNetwork { network, population: id, exc, inh };

    // The delay bounds only shape this value; connections keep the engine's
    // one-step delivery.
    let delay = config.delay();
    info!(?delay, "derived synaptic delay (not applied to projections)");

    for spec in &PROJECTIONS {
        let matrix = load_matrix_market(config.matrix_path(spec.file))?;
        let mut projection =
            Projection::new(spec.name, coba.view(spec.pre), coba.view(spec.post), spec.target);
        projection.connect_from_sparse(matrix)?;
        info!(
            projection = spec.name,
            target = %spec.target,
            synapses = projection.nb_synapses(),
            "connected"
        );
        coba.network.add_projection(projection)?;
    }

    Ok(coba)
}

/// Mean firing rate (Hz) over all neurons
pub fn mean_firing_rate(total_spikes: usize, simtime: f64) -> f64 {
    if simtime <= 0.0 {
        return 0.0;
    }
    total_spikes as f64 / (simtime * NB_NEURONS as f64)
}

fn progress_bar(steps: u64) -> ProgressBar {
    let bar = ProgressBar::new(steps);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} steps ({eta})") {
        bar.set_style(style);
    }
    bar
}

/// Build, compile and simulate; write the mode's output file
pub fn run<W: Write>(config: &BenchConfig, out: &mut W) -> Result<BenchOutcome> {
    let CobaNetwork { mut network, population, .. } = build_network(config)?;
    let duration = config.duration_ms();

    if config.fast {
        let mut simulation = network.compile()?;

        let start = Instant::now();
        simulation.simulate(duration)?;
        let seconds = start.elapsed().as_secs_f64();

        let path = write_timefile(&config.output_dir, seconds)?;
        info!(seconds, path = %path.display(), "timing written");
        return Ok(BenchOutcome::Timed { seconds, path });
    }

    let monitor_id = network.monitor_spikes(population)?;
    let mut simulation = network.compile()?;

    let bar = progress_bar(coba_core::ms_to_steps(duration, config.dt));
    simulation.simulate_with(duration, |done| {
        if done % 100 == 0 {
            bar.set_position(done);
        }
    })?;
    bar.finish_and_clear();

    let monitor = simulation.monitor(monitor_id).ok_or(BenchError::MissingMonitor)?;
    let (spike_times, _) = monitor.raster_plot(config.dt);
    let total_spikes = spike_times.len();
    let (path, written_spikes) = write_spikes(&config.output_dir, monitor, NB_EXC)?;
    if written_spikes < total_spikes {
        warn!(
            omitted = total_spikes - written_spikes,
            "spikes of inhibitory neurons are not written to {}",
            path.display()
        );
    }

    let mean_rate = mean_firing_rate(total_spikes, config.simtime);
    writeln!(out, "Mean firing rate in the population: {}Hz", mean_rate)?;

    Ok(BenchOutcome::Monitored {
        total_spikes,
        written_spikes,
        mean_rate,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::BenchArgs;
    use crate::config::{SPIKES_FILE, TIME_FILE};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Matrices with a single zero weight: connected, but without effect
    fn write_silent_matrices(dir: &Path) {
        for (name, rows, cols) in [("ee", 3200, 3200), ("ei", 3200, 800), ("ie", 800, 3200), ("ii", 800, 800)] {
            let text = format!(
                "%%MatrixMarket matrix coordinate real general\n{} {} 1\n1 1 0.0\n",
                rows, cols
            );
            fs::write(dir.join(format!("{}.wmat", name)), text).unwrap();
        }
    }

    fn config(dir: &Path, simtime: f64, fast: bool) -> BenchConfig {
        BenchConfig {
            simtime,
            fast,
            ..BenchConfig::default()
        }
        .with_dirs(dir, dir)
    }

    #[test]
    fn test_build_network() {
        let dir = TempDir::new().unwrap();
        write_silent_matrices(dir.path());

        let coba = build_network(&config(dir.path(), 1.0, false)).unwrap();
        assert_eq!(coba.exc.range(), 0..3200);
        assert_eq!(coba.inh.range(), 3200..4000);
        assert_eq!(coba.network.projections().len(), 4);

        let targets: Vec<Target> = coba.network.projections().iter().map(|p| p.target).collect();
        assert_eq!(targets, vec![Target::Exc, Target::Exc, Target::Inh, Target::Inh]);

        let pop = coba.network.population(coba.population).unwrap();
        assert!(pop.v.iter().all(|&v| v == -55.0));
    }

    #[test]
    fn test_missing_matrix_aborts() {
        let dir = TempDir::new().unwrap();
        let err = build_network(&config(dir.path(), 1.0, false)).unwrap_err();
        assert!(matches!(err, BenchError::Engine(_)));
    }

    #[test]
    fn test_wrong_matrix_shape_aborts() {
        let dir = TempDir::new().unwrap();
        write_silent_matrices(dir.path());
        fs::write(
            dir.path().join("ei.wmat"),
            "%%MatrixMarket matrix coordinate real general\n3200 3200 1\n1 1 0.0\n",
        )
        .unwrap();

        assert!(build_network(&config(dir.path(), 1.0, false)).is_err());
    }

    #[test]
    fn test_fast_mode_writes_timefile_only() {
        let dir = TempDir::new().unwrap();
        write_silent_matrices(dir.path());

        let mut out = Vec::new();
        let outcome = run(&config(dir.path(), 0.01, true), &mut out).unwrap();

        assert!(matches!(outcome, BenchOutcome::Timed { seconds, .. } if seconds >= 0.0));
        let text = fs::read_to_string(dir.path().join(TIME_FILE)).unwrap();
        assert!(text.trim().parse::<f64>().is_ok());
        assert!(!text.contains('\n'));
        assert!(!dir.path().join(SPIKES_FILE).exists());
        assert!(out.is_empty());
    }

    #[test]
    fn test_monitored_mode_writes_spikes_and_rate() {
        let dir = TempDir::new().unwrap();
        write_silent_matrices(dir.path());

        let mut out = Vec::new();
        let outcome = run(&config(dir.path(), 0.02, false), &mut out).unwrap();

        // Every neuron fires once at step 80 and is refractory or below
        // threshold for the remaining 200-step run.
        let BenchOutcome::Monitored { total_spikes, written_spikes, mean_rate, path } = outcome else {
            panic!("expected a monitored run");
        };
        assert_eq!(total_spikes, 4000);
        assert_eq!(written_spikes, 3200);
        assert!((mean_rate - 50.0).abs() < 1e-9);
        assert!(!dir.path().join(TIME_FILE).exists());

        let spikes = fs::read_to_string(path).unwrap();
        assert_eq!(spikes.lines().count(), 3200);
        for line in spikes.lines() {
            let (idx, step) = line.split_once('\t').unwrap();
            assert!(idx.parse::<usize>().unwrap() < 3200);
            assert_eq!(step, "80");
        }

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Mean firing rate in the population: 50"));
        assert!(out.trim_end().ends_with("Hz"));
    }

    #[test]
    fn test_command_line_without_fast_runs_monitored() {
        let dir = TempDir::new().unwrap();
        write_silent_matrices(dir.path());

        let mut echo = Vec::new();
        let args = BenchArgs::try_parse_from(["coba", "--simtime=0.02"], &mut echo).unwrap();
        let config = BenchConfig::from_args(&args).with_dirs(dir.path(), dir.path());

        let mut out = Vec::new();
        let outcome = run(&config, &mut out).unwrap();

        assert!(matches!(outcome, BenchOutcome::Monitored { total_spikes: 4000, .. }));
        assert!(dir.path().join(SPIKES_FILE).exists());
        assert!(!dir.path().join(TIME_FILE).exists());
        assert_eq!(String::from_utf8(echo).unwrap(), "Simulation Time: 0.02\n");
        assert!(String::from_utf8(out).unwrap().starts_with("Mean firing rate in the population: 50"));
    }

    #[test]
    fn test_mean_firing_rate() {
        assert_eq!(mean_firing_rate(8000, 1.0), 2.0);
        assert_eq!(mean_firing_rate(10, 0.0), 0.0);
    }
}
