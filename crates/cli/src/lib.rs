#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the thin command-line front end for the `fsbench`
//! workspace. It recognises three subcommands: `stat` times one stat strategy
//! over a newline-delimited path list, `walk` times one enumeration strategy
//! over a directory tree with an optional cross-validating stat strategy, and
//! `avg` performs the truncating integer division used to combine results
//! captured by external driver scripts.
//!
//! # Design
//!
//! The crate exposes [`run`] as the primary entry point. The function accepts
//! an iterator of arguments together with handles for standard output and
//! error, so tests can drive the full front end without spawning a process.
//! A [`clap`](https://docs.rs/clap/) command definition enforces the closed
//! strategy value sets and the required/conflicting argument combinations at
//! parse time; the measuring core is only entered with a valid configuration.
//!
//! # Invariants
//!
//! - `run` never panics on user input; usage mistakes exit with status 2
//!   before any measuring work, runtime failures exit with status 1.
//! - The human report and per-entry listing go to standard error; standard
//!   output carries only the bare machine-readable figure requested with
//!   `--result`, so the two channels can be captured independently.

use std::ffi::OsString;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Once;

use clap::{Arg, ArgAction, ArgMatches, Command, error::ErrorKind, value_parser};
use harness::{Harness, HarnessError, PrintLevel, RunReport, Workload, load_path_list};
use stat::StatStrategy;
use thiserror::Error;
use timestamp::format_duration;
use walk::WalkStrategy;

/// Exit status for usage errors detected during argument parsing.
const USAGE_EXIT_CODE: i32 = 2;

/// Exit status for runtime failures after a successful parse.
const FAILURE_EXIT_CODE: i32 = 1;

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Runtime failure after a successful argument parse.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Harness(#[from] HarnessError),
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new("fsbench")
        .about("Measures the per-entry cost of filesystem metadata primitives")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(stat_command())
        .subcommand(walk_command())
        .subcommand(avg_command())
}

fn stat_command() -> Command {
    Command::new("stat")
        .about("Time one stat strategy over a newline-delimited path list")
        .arg(
            Arg::new("strategy")
                .long("strategy")
                .short('s')
                .value_name("STRATEGY")
                .required(true)
                .value_parser(parse_stat_strategy)
                .help("Stat primitive to measure."),
        )
        .arg(result_arg())
        .arg(repeat_arg())
        .arg(warm_up_arg())
        .arg(
            Arg::new("paths-file")
                .value_name("PATHS_FILE")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("File holding one path per line."),
        )
}

fn walk_command() -> Command {
    Command::new("walk")
        .about("Time one enumeration strategy over a directory tree")
        .arg(
            Arg::new("walk")
                .long("walk")
                .short('w')
                .value_name("STRATEGY")
                .required(true)
                .value_parser(parse_walk_strategy)
                .help("Enumeration primitive to measure."),
        )
        .arg(
            Arg::new("stat")
                .long("stat")
                .short('s')
                .value_name("STRATEGY")
                .value_parser(parse_stat_strategy)
                .help(
                    "Additionally stat every entry; timestamps the listing \
                     surfaced are cross-checked against the stat reading.",
                ),
        )
        .arg(
            Arg::new("print")
                .long("print")
                .short('P')
                .value_name("LEVEL")
                .value_parser(value_parser!(u8))
                .default_value("0")
                .help("Per-entry output: 0 none, 1 paths, 2 paths with timestamps."),
        )
        .arg(result_arg())
        .arg(repeat_arg())
        .arg(warm_up_arg())
        .arg(
            Arg::new("dir")
                .value_name("DIR")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Root of the tree to enumerate."),
        )
}

fn avg_command() -> Command {
    Command::new("avg")
        .about("Print the truncating quotient of two integers")
        .arg(
            Arg::new("sum")
                .value_name("SUM")
                .required(true)
                .value_parser(value_parser!(u64))
                .help("Accumulated nanosecond total."),
        )
        .arg(
            Arg::new("count")
                .value_name("COUNT")
                .required(true)
                .value_parser(value_parser!(u64).range(1..))
                .help("Number of samples; must be at least 1."),
        )
}

fn result_arg() -> Arg {
    Arg::new("result")
        .long("result")
        .short('r')
        .action(ArgAction::SetTrue)
        .help("Print the bare per-entry nanosecond figure to standard output.")
}

fn repeat_arg() -> Arg {
    Arg::new("repeat")
        .long("repeat")
        .value_name("N")
        .value_parser(value_parser!(u64).range(1..))
        .default_value("1")
        .help("Number of measured passes; figures are averaged across passes.")
}

fn warm_up_arg() -> Arg {
    Arg::new("warm-up")
        .long("warm-up")
        .action(ArgAction::SetTrue)
        .help("Run one unmeasured pass first to prime OS caches.")
}

fn parse_stat_strategy(value: &str) -> Result<StatStrategy, String> {
    StatStrategy::from_name(value).ok_or_else(|| {
        format!(
            "unknown stat strategy '{value}' (expected one of: {})",
            StatStrategy::NAMES.join(", ")
        )
    })
}

fn parse_walk_strategy(value: &str) -> Result<WalkStrategy, String> {
    WalkStrategy::from_name(value).ok_or_else(|| {
        format!(
            "unknown walk strategy '{value}' (expected one of: {})",
            WalkStrategy::NAMES.join(", ")
        )
    })
}

/// Installs the `RUST_LOG`-driven diagnostics subscriber once per process.
fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::from_default_env();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    });
}

/// Runs the CLI using the provided argument iterator and output handles.
///
/// Returns the process exit code the caller should use: 0 on success, 1 on
/// any runtime failure, 2 on usage errors. Help and version requests print to
/// `stdout` and exit 0.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    init_tracing();

    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from("fsbench"));
    }

    let matches = match clap_command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(error) => {
            let rendered = error.render();
            return match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = write!(stdout, "{rendered}");
                    0
                }
                _ => {
                    let _ = write!(stderr, "{rendered}");
                    USAGE_EXIT_CODE
                }
            };
        }
    };

    match dispatch(&matches, stdout, stderr) {
        Ok(()) => 0,
        Err(error) => {
            let _ = writeln!(stderr, "fsbench: {error}");
            FAILURE_EXIT_CODE
        }
    }
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}

fn dispatch<Out, Err>(
    matches: &ArgMatches,
    stdout: &mut Out,
    stderr: &mut Err,
) -> Result<(), CliError>
where
    Out: Write,
    Err: Write,
{
    match matches.subcommand() {
        Some(("stat", sub)) => run_stat(sub, stdout, stderr),
        Some(("walk", sub)) => run_walk(sub, stdout, stderr),
        Some(("avg", sub)) => run_avg(sub, stdout),
        // clap enforces subcommand_required before dispatch is reached.
        _ => Ok(()),
    }
}

fn run_stat<Out, Err>(
    matches: &ArgMatches,
    stdout: &mut Out,
    stderr: &mut Err,
) -> Result<(), CliError>
where
    Out: Write,
    Err: Write,
{
    let strategy = *matches
        .get_one::<StatStrategy>("strategy")
        .expect("strategy is required");
    let file = matches
        .get_one::<PathBuf>("paths-file")
        .expect("paths-file is required");

    let paths = load_path_list(file)?;
    tracing::debug!(strategy = strategy.name(), paths = paths.len(), "stat run");

    let workload = Workload::Stat { strategy, paths };
    measure(&workload, matches, stdout, stderr)
}

fn run_walk<Out, Err>(
    matches: &ArgMatches,
    stdout: &mut Out,
    stderr: &mut Err,
) -> Result<(), CliError>
where
    Out: Write,
    Err: Write,
{
    let strategy = *matches
        .get_one::<WalkStrategy>("walk")
        .expect("walk strategy is required");
    let stat = matches.get_one::<StatStrategy>("stat").copied();
    let print = matches.get_one::<u8>("print").copied().unwrap_or(0);
    let root = matches
        .get_one::<PathBuf>("dir")
        .expect("dir is required")
        .clone();

    tracing::debug!(
        strategy = strategy.name(),
        stat = stat.map(|s| s.name()),
        root = %root.display(),
        "walk run"
    );

    let workload = Workload::Walk {
        strategy,
        stat,
        root,
        print: PrintLevel::from_level(print),
    };
    measure(&workload, matches, stdout, stderr)
}

fn run_avg<Out: Write>(matches: &ArgMatches, stdout: &mut Out) -> Result<(), CliError> {
    let sum = *matches.get_one::<u64>("sum").expect("sum is required");
    let count = *matches.get_one::<u64>("count").expect("count is required");
    writeln!(stdout, "{}", sum / count)?;
    Ok(())
}

fn measure<Out, Err>(
    workload: &Workload,
    matches: &ArgMatches,
    stdout: &mut Out,
    stderr: &mut Err,
) -> Result<(), CliError>
where
    Out: Write,
    Err: Write,
{
    let repeat = matches.get_one::<u64>("repeat").copied().unwrap_or(1);
    let repeat = usize::try_from(repeat)
        .ok()
        .and_then(NonZeroUsize::new)
        .unwrap_or(NonZeroUsize::MIN);
    let warm_up = matches.get_flag("warm-up");

    let mut harness = Harness::new();
    let report = harness.run(workload, repeat, warm_up, stderr)?;
    write_report(&report, matches.get_flag("result"), stdout, stderr)?;
    Ok(())
}

fn write_report<Out, Err>(
    report: &RunReport,
    result: bool,
    stdout: &mut Out,
    stderr: &mut Err,
) -> io::Result<()>
where
    Out: Write,
    Err: Write,
{
    let last = report.last();
    writeln!(stderr, "entries: {}", last.entries)?;
    writeln!(stderr, "full time: {}", format_duration(last.elapsed, true))?;
    writeln!(
        stderr,
        "time per entry: {}",
        format_duration(report.per_entry(), true)
    )?;
    if result {
        writeln!(stdout, "{}", report.per_entry_ns)?;
    }
    Ok(())
}
