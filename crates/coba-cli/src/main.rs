//! # COBA benchmark CLI
//!
//! Reads `../{ee,ei,ie,ii}.wmat` and writes `timefile.dat` (`--fast`) or
//! `spikes.out` to the working directory.

use coba_cli::{run, ArgsError, BenchArgs, BenchConfig};
use colored::Colorize;
use std::io;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the option echo and the rate line.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = match BenchArgs::try_parse_from(std::env::args_os(), &mut io::stdout()) {
        Ok(args) => args,
        Err(ArgsError::Usage(err)) if !err.use_stderr() => err.exit(),
        Err(err) => {
            println!("{}", err.to_string().red());
            std::process::exit(err.exit_code());
        }
    };

    let config = BenchConfig::from_args(&args);
    run(&config, &mut io::stdout())?;

    Ok(())
}
