//! Command-line options.
//!
//! Options are long-only and are applied in the order they appear, so a
//! later `--num_timesteps_min_delay` can raise an earlier maximum while a
//! later `--num_timesteps_max_delay` below the current minimum is fatal.
//! Unique prefixes of option names are accepted, and everything from the
//! first non-option argument on is kept as operands.

use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::{self, Write};
use thiserror::Error;

const FAST: &str = "fast";
const SIMTIME: &str = "simtime";
const MIN_DELAY: &str = "num_timesteps_min_delay";
const MAX_DELAY: &str = "num_timesteps_max_delay";
const OPERANDS: &str = "operands";

#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("{0}")]
    Usage(#[from] clap::Error),
    #[error("ERROR: Max delay should not be smaller than min!")]
    DelayBounds { min: u32, max: u32 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ArgsError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ArgsError::Usage(err) => err.exit_code(),
            ArgsError::DelayBounds { .. } | ArgsError::Io(_) => 1,
        }
    }
}

/// Parsed benchmark options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchArgs {
    /// Skip spike monitoring and time the run instead
    pub fast: bool,
    /// Simulated duration (s)
    pub simtime: f64,
    pub num_timesteps_min_delay: u32,
    pub num_timesteps_max_delay: u32,
    /// Operands left after the options; accepted and ignored
    pub operands: Vec<String>,
}

impl Default for BenchArgs {
    fn default() -> Self {
        Self {
            fast: false,
            simtime: 1.0,
            num_timesteps_min_delay: 1,
            num_timesteps_max_delay: 1,
            operands: Vec::new(),
        }
    }
}

/// One option occurrence with the argument text as typed
enum Event {
    Fast,
    Simtime(f64, String),
    MinDelay(u32, String),
    MaxDelay(u32, String),
}

pub fn command() -> Command {
    Command::new("coba")
        .about("COBA balanced excitatory/inhibitory network benchmark")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .infer_long_args(true)
        .arg(
            Arg::new(FAST)
                .long(FAST)
                .action(ArgAction::Count)
                .help("Run without monitoring spikes and write the wall-clock time to timefile.dat"),
        )
        .arg(
            Arg::new(SIMTIME)
                .long(SIMTIME)
                .value_name("SECONDS")
                .value_parser(parse_simtime)
                .action(ArgAction::Append)
                .help("Simulated duration in seconds [default: 1.0]"),
        )
        .arg(
            Arg::new(MIN_DELAY)
                .long(MIN_DELAY)
                .value_name("STEPS")
                .value_parser(value_parser!(u32))
                .action(ArgAction::Append)
                .help("Lower bound of the synaptic delay in timesteps [default: 1]"),
        )
        .arg(
            Arg::new(MAX_DELAY)
                .long(MAX_DELAY)
                .value_name("STEPS")
                .value_parser(value_parser!(u32))
                .action(ArgAction::Append)
                .help("Upper bound of the synaptic delay in timesteps [default: 1]"),
        )
        .arg(
            Arg::new(OPERANDS)
                .value_name("ARGS")
                .num_args(1..)
                .trailing_var_arg(true)
                .value_parser(value_parser!(String))
                .action(ArgAction::Append),
        )
}

fn parse_simtime(value: &str) -> Result<f64, String> {
    let simtime: f64 = value.parse().map_err(|e| format!("{}", e))?;
    if simtime.is_finite() && simtime >= 0.0 {
        Ok(simtime)
    } else {
        Err(format!("expected a non-negative number of seconds, got {}", value))
    }
}

/// Occurrences of one option given on the command line, tagged with their
/// position and raw text
fn occurrences<T, F>(matches: &ArgMatches, id: &str, to_event: F) -> Vec<(usize, Event)>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T, String) -> Event,
{
    if matches.value_source(id) != Some(ValueSource::CommandLine) {
        return Vec::new();
    }
    match (
        matches.indices_of(id),
        matches.get_many::<T>(id),
        matches.get_raw(id),
    ) {
        (Some(indices), Some(values), Some(raw)) => indices
            .zip(values.cloned())
            .zip(raw)
            .map(|((idx, value), text)| (idx, to_event(value, text.to_string_lossy().into_owned())))
            .collect(),
        _ => Vec::new(),
    }
}

impl BenchArgs {
    /// Parse `argv` (program name first), echoing each accepted option to `out`.
    pub fn try_parse_from<I, T, W>(argv: I, out: &mut W) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        W: Write,
    {
        let matches = command().try_get_matches_from(argv)?;

        let mut events: Vec<(usize, Event)> = Vec::new();
        if matches.value_source(FAST) == Some(ValueSource::CommandLine) {
            if let Some(indices) = matches.indices_of(FAST) {
                events.extend(indices.map(|idx| (idx, Event::Fast)));
            }
        }
        events.extend(occurrences(&matches, SIMTIME, Event::Simtime));
        events.extend(occurrences(&matches, MIN_DELAY, Event::MinDelay));
        events.extend(occurrences(&matches, MAX_DELAY, Event::MaxDelay));
        events.sort_by_key(|(idx, _)| *idx);

        let mut args = BenchArgs {
            operands: matches
                .get_many::<String>(OPERANDS)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            ..BenchArgs::default()
        };
        for (_, event) in events {
            match event {
                Event::Fast => {
                    args.fast = true;
                    writeln!(out, "Running without Monitoring Spikes (fast mode)\n")?;
                }
                Event::Simtime(simtime, text) => {
                    args.simtime = simtime;
                    writeln!(out, "Simulation Time: {}", text)?;
                }
                Event::MinDelay(min, text) => {
                    args.num_timesteps_min_delay = min;
                    if args.num_timesteps_max_delay < min {
                        args.num_timesteps_max_delay = min;
                    }
                    writeln!(out, "Minimum delay (in number of timesteps): {}", text)?;
                }
                Event::MaxDelay(max, text) => {
                    if max < args.num_timesteps_min_delay {
                        return Err(ArgsError::DelayBounds {
                            min: args.num_timesteps_min_delay,
                            max,
                        });
                    }
                    args.num_timesteps_max_delay = max;
                    writeln!(out, "Maximum delay (in number of timesteps): {}", text)?;
                }
            }
        }

        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> (Result<BenchArgs, ArgsError>, String) {
        let mut out = Vec::new();
        let result = BenchArgs::try_parse_from(
            std::iter::once("coba").chain(argv.iter().copied()),
            &mut out,
        );
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_defaults() {
        let (args, out) = parse(&[]);
        assert_eq!(args.unwrap(), BenchArgs::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_all_options() {
        let (args, out) = parse(&[
            "--fast",
            "--simtime=2.5",
            "--num_timesteps_min_delay=2",
            "--num_timesteps_max_delay=8",
        ]);
        let args = args.unwrap();

        assert!(args.fast);
        assert_eq!(args.simtime, 2.5);
        assert_eq!(args.num_timesteps_min_delay, 2);
        assert_eq!(args.num_timesteps_max_delay, 8);
        assert_eq!(
            out,
            "Running without Monitoring Spikes (fast mode)\n\n\
             Simulation Time: 2.5\n\
             Minimum delay (in number of timesteps): 2\n\
             Maximum delay (in number of timesteps): 8\n"
        );
    }

    #[test]
    fn test_without_fast_flag_is_monitored() {
        let (args, out) = parse(&["--simtime=0.5"]);
        let args = args.unwrap();
        assert!(!args.fast);
        assert!(!out.contains("fast mode"));
    }

    #[test]
    fn test_echo_follows_command_line_order() {
        let (args, out) = parse(&["--simtime=2", "--fast", "--num_timesteps_min_delay=3"]);
        assert!(args.unwrap().fast);
        assert_eq!(
            out,
            "Simulation Time: 2\n\
             Running without Monitoring Spikes (fast mode)\n\n\
             Minimum delay (in number of timesteps): 3\n"
        );
    }

    #[test]
    fn test_echo_keeps_argument_text() {
        let (args, out) = parse(&["--simtime=1.0", "--num_timesteps_min_delay=03"]);
        let args = args.unwrap();
        assert_eq!(args.simtime, 1.0);
        assert_eq!(args.num_timesteps_min_delay, 3);
        assert!(out.contains("Simulation Time: 1.0\n"));
        assert!(out.contains("Minimum delay (in number of timesteps): 03\n"));
    }

    #[test]
    fn test_option_prefixes() {
        let (args, out) = parse(&["--sim=2", "--fa", "--num_timesteps_ma=4"]);
        let args = args.unwrap();
        assert_eq!(args.simtime, 2.0);
        assert!(args.fast);
        assert_eq!(args.num_timesteps_max_delay, 4);
        assert!(out.starts_with("Simulation Time: 2\n"));

        // Shared by both delay options
        let (result, _) = parse(&["--num_timesteps=4"]);
        assert_eq!(result.unwrap_err().exit_code(), 2);
    }

    #[test]
    fn test_trailing_operands_are_ignored() {
        let (args, out) = parse(&["--simtime=0.5", "extra", "--fast"]);
        let args = args.unwrap();
        assert_eq!(args.simtime, 0.5);
        assert!(!args.fast);
        assert_eq!(args.operands, vec!["extra".to_string(), "--fast".to_string()]);
        assert_eq!(out, "Simulation Time: 0.5\n");
    }

    #[test]
    fn test_min_raises_max() {
        let (args, _) = parse(&["--num_timesteps_min_delay=5"]);
        let args = args.unwrap();
        assert_eq!(args.num_timesteps_min_delay, 5);
        assert_eq!(args.num_timesteps_max_delay, 5);

        // A larger max set earlier is kept
        let (args, _) = parse(&["--num_timesteps_max_delay=9", "--num_timesteps_min_delay=5"]);
        assert_eq!(args.unwrap().num_timesteps_max_delay, 9);
    }

    #[test]
    fn test_max_below_min_fails_with_status_1() {
        let (result, out) = parse(&["--num_timesteps_min_delay=4", "--num_timesteps_max_delay=2"]);
        let err = result.unwrap_err();

        assert!(matches!(err, ArgsError::DelayBounds { min: 4, max: 2 }));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "ERROR: Max delay should not be smaller than min!");
        assert!(out.contains("Minimum delay (in number of timesteps): 4"));
    }

    #[test]
    fn test_order_matters() {
        // Max first, then a larger min: max is raised, no error
        let (args, _) = parse(&["--num_timesteps_max_delay=2", "--num_timesteps_min_delay=4"]);
        let args = args.unwrap();
        assert_eq!(args.num_timesteps_min_delay, 4);
        assert_eq!(args.num_timesteps_max_delay, 4);
    }

    #[test]
    fn test_max_below_default_min() {
        let (result, _) = parse(&["--num_timesteps_max_delay=0"]);
        assert_eq!(result.unwrap_err().exit_code(), 1);
    }

    #[test]
    fn test_repeated_option_last_wins() {
        let (args, _) = parse(&["--simtime=1.0", "--simtime", "3.0"]);
        assert_eq!(args.unwrap().simtime, 3.0);
    }

    #[test]
    fn test_bad_arguments_fail_with_status_2() {
        for argv in [
            &["--unknown"][..],
            &["--simtime=abc"],
            &["--simtime=-1"],
            &["--num_timesteps_min_delay=1.5"],
            &["--num_timesteps_max_delay=-3"],
            &["--simtime"],
            &["--fast=yes"],
            &["-f"],
            &["--help"],
            &["--version"],
        ] {
            let (result, _) = parse(argv);
            let err = result.unwrap_err();
            assert!(matches!(err, ArgsError::Usage(_)), "{:?}", argv);
            assert_eq!(err.exit_code(), 2, "{:?}", argv);
        }
    }
}
