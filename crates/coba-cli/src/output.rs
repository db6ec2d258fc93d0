//! Benchmark output files.

use coba_engine::SpikeMonitor;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{SPIKES_FILE, TIME_FILE};

/// Write the elapsed wall-clock seconds to `timefile.dat` (no newline)
pub fn write_timefile(dir: &Path, seconds: f64) -> io::Result<PathBuf> {
    let path = dir.join(TIME_FILE);
    fs::write(&path, format!("{:.6}", seconds))?;
    Ok(path)
}

/// Write `<neuron>\t<timestep>` lines to `spikes.out` for neurons
/// `0..limit`, neuron by neuron. Returns the path and the number of lines.
pub fn write_spikes(dir: &Path, monitor: &SpikeMonitor, limit: usize) -> io::Result<(PathBuf, usize)> {
    let path = dir.join(SPIKES_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    let mut lines = 0;

    for neuron in 0..limit.min(monitor.size()) {
        for step in monitor.spikes(neuron) {
            writeln!(writer, "{}\t{}", neuron, step)?;
            lines += 1;
        }
    }
    writer.flush()?;

    Ok((path, lines))
}
