#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `harness` drives one stat or enumeration workload under wall-clock timing
//! and reduces the passes to a per-entry latency figure.
//!
//! # Design
//!
//! - A [`Harness`] value runs exactly once. Its state machine
//!   (`Idle -> Running -> Completed | Failed`) is queryable and a second
//!   `run` call is an error, so a stale harness can never masquerade as a
//!   fresh measurement.
//! - The clock brackets a whole pass over the input; the per-entry figure is
//!   the truncating quotient of the pass duration and the entry count. An
//!   optional unmeasured warm-up pass primes OS caches first, and repeated
//!   measured passes are reduced with the truncating arithmetic mean.
//! - Per-entry work (counting, the optional cross-validating stat call,
//!   printing) runs inside the measured region. The harness measures the
//!   workload as configured, not an idealised subset of it.
//!
//! # Invariants
//!
//! - A pass that processes zero entries fails the run; a per-entry figure
//!   over nothing is meaningless and would divide by zero.
//! - The path list is loaded into memory before the clock starts; file
//!   parsing never counts against the primitive under test.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use stat::{StatError, StatStrategy};
use thiserror::Error;
use timestamp::average_ns;
use walk::{Entry, Visitor, WalkError, WalkStrategy, check_consistency};

/// Error returned when a measured run cannot produce a figure.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The path-list file could not be opened or read.
    #[error("failed to read path list '{path}': {source}")]
    Input {
        /// Path-list file that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// A pass processed zero entries.
    #[error("workload produced no entries")]
    EmptyInput,
    /// The harness already completed or failed a run.
    #[error("harness has already run")]
    Exhausted,
    /// A stat call failed during a stat workload pass.
    #[error(transparent)]
    Stat(#[from] StatError),
    /// An enumeration pass failed.
    #[error(transparent)]
    Walk(#[from] WalkError),
}

/// Lifecycle of a [`Harness`] value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No run has started.
    Idle,
    /// A run is in progress.
    Running,
    /// The run finished and produced a report.
    Completed,
    /// The run terminated with an error.
    Failed,
}

/// How much per-entry output an enumeration pass writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrintLevel {
    /// No per-entry output.
    Silent,
    /// One line per entry: the path.
    Paths,
    /// One line per entry: kind, path, and every observed timestamp pair.
    Detailed,
}

impl PrintLevel {
    /// Maps a numeric verbosity level; values above 2 clamp to
    /// [`PrintLevel::Detailed`].
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Silent,
            1 => Self::Paths,
            _ => Self::Detailed,
        }
    }
}

/// One workload selection, fixed for the lifetime of a run.
#[derive(Clone, Debug)]
pub enum Workload {
    /// Stat every path in a pre-loaded list.
    Stat {
        /// Strategy dispatched per path.
        strategy: StatStrategy,
        /// Paths to stat, in list order.
        paths: Vec<PathBuf>,
    },
    /// Recursively enumerate a directory tree.
    Walk {
        /// Enumeration strategy dispatched over the tree.
        strategy: WalkStrategy,
        /// Optional per-entry stat call; when the enumeration primitive also
        /// surfaced timestamps, the two readings are cross-validated.
        stat: Option<StatStrategy>,
        /// Tree root.
        root: PathBuf,
        /// Per-entry output verbosity.
        print: PrintLevel,
    },
}

/// Reads a newline-delimited path list into memory.
///
/// Empty lines are kept as empty paths; statting one reports the error the
/// OS gives for an empty path, same as any other unusable list entry. A
/// trailing unterminated line is accepted.
pub fn load_path_list(file: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let input = |source| HarnessError::Input {
        path: file.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(file).map_err(input)?);
    let mut paths = Vec::new();
    for line in reader.lines() {
        paths.push(PathBuf::from(line.map_err(input)?));
    }
    Ok(paths)
}

/// Timing of one measured pass.
#[derive(Clone, Copy, Debug)]
pub struct Measurement {
    /// Entries the pass processed.
    pub entries: u64,
    /// Wall-clock time of the whole pass.
    pub elapsed: Duration,
    /// Truncating quotient `elapsed / entries` in nanoseconds.
    pub per_entry_ns: u64,
}

/// Outcome of a completed run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Every measured pass, in execution order.
    pub passes: Vec<Measurement>,
    /// Truncating mean of the per-pass per-entry figures.
    pub per_entry_ns: u64,
}

impl RunReport {
    /// Timing of the final measured pass.
    #[must_use]
    pub fn last(&self) -> &Measurement {
        // run() pushes at least one pass before constructing the report.
        self.passes.last().unwrap_or_else(|| unreachable!())
    }

    /// Cross-pass per-entry figure as a [`Duration`].
    #[must_use]
    pub const fn per_entry(&self) -> Duration {
        Duration::from_nanos(self.per_entry_ns)
    }
}

/// Single-use driver for one workload.
#[derive(Debug)]
pub struct Harness {
    state: State,
}

impl Harness {
    /// Creates an idle harness.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Runs `workload` for `repeat` measured passes, preceded by one
    /// unmeasured pass when `warm_up` is set. Per-entry output is written to
    /// `sink`.
    pub fn run(
        &mut self,
        workload: &Workload,
        repeat: NonZeroUsize,
        warm_up: bool,
        sink: &mut dyn Write,
    ) -> Result<RunReport, HarnessError> {
        if self.state != State::Idle {
            return Err(HarnessError::Exhausted);
        }
        self.state = State::Running;
        match self.drive(workload, repeat, warm_up, sink) {
            Ok(report) => {
                self.state = State::Completed;
                Ok(report)
            }
            Err(error) => {
                self.state = State::Failed;
                Err(error)
            }
        }
    }

    fn drive(
        &self,
        workload: &Workload,
        repeat: NonZeroUsize,
        warm_up: bool,
        sink: &mut dyn Write,
    ) -> Result<RunReport, HarnessError> {
        if warm_up {
            let discarded = run_pass(workload, sink)?;
            tracing::debug!(
                entries = discarded.entries,
                elapsed_ns = u64::try_from(discarded.elapsed.as_nanos()).unwrap_or(u64::MAX),
                "warm-up pass discarded"
            );
        }

        let mut passes = Vec::with_capacity(repeat.get());
        for pass in 0..repeat.get() {
            let measurement = run_pass(workload, sink)?;
            tracing::debug!(
                pass,
                entries = measurement.entries,
                per_entry_ns = measurement.per_entry_ns,
                "measured pass"
            );
            passes.push(measurement);
        }

        let samples: Vec<u64> = passes.iter().map(|pass| pass.per_entry_ns).collect();
        Ok(RunReport {
            passes,
            per_entry_ns: average_ns(&samples),
        })
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

fn run_pass(workload: &Workload, sink: &mut dyn Write) -> Result<Measurement, HarnessError> {
    let start = Instant::now();
    let entries = match workload {
        Workload::Stat { strategy, paths } => {
            for path in paths {
                strategy.entry_time(path)?;
            }
            paths.len() as u64
        }
        Workload::Walk {
            strategy,
            stat,
            root,
            print,
        } => {
            let mut inspector = Inspector {
                entries: 0,
                stat: *stat,
                print: *print,
                sink,
            };
            strategy.walk(root, &mut inspector)?;
            inspector.entries
        }
    };
    let elapsed = start.elapsed();

    if entries == 0 {
        return Err(HarnessError::EmptyInput);
    }
    let per_entry_ns =
        u64::try_from(elapsed.as_nanos() / u128::from(entries)).unwrap_or(u64::MAX);
    Ok(Measurement {
        entries,
        elapsed,
        per_entry_ns,
    })
}

/// Visitor performing the per-entry work of an enumeration pass.
struct Inspector<'a> {
    entries: u64,
    stat: Option<StatStrategy>,
    print: PrintLevel,
    sink: &'a mut dyn Write,
}

impl Inspector<'_> {
    fn emit(&mut self, entry: &Entry, stated: Option<&timestamp::EntryTime>) -> io::Result<()> {
        match self.print {
            PrintLevel::Silent => Ok(()),
            PrintLevel::Paths => writeln!(self.sink, "{}", entry.path.display()),
            PrintLevel::Detailed => {
                write!(self.sink, "{} {}", entry.kind.label(), entry.path.display())?;
                if let Some(times) = &entry.times {
                    write!(self.sink, " mod {} acc {}", times.modification, times.access)?;
                }
                if let Some(times) = stated {
                    write!(
                        self.sink,
                        " stat mod {} acc {}",
                        times.modification, times.access
                    )?;
                }
                writeln!(self.sink)
            }
        }
    }
}

impl Visitor for Inspector<'_> {
    fn entry(&mut self, entry: &Entry) -> Result<(), WalkError> {
        self.entries += 1;

        let mut stated = None;
        if let Some(strategy) = self.stat {
            let pair = strategy.entry_time(&entry.path)?;
            if let Some(observed) = &entry.times {
                check_consistency(&entry.path, observed, &pair)?;
            }
            stated = Some(pair);
        }

        self.emit(entry, stated.as_ref())
            .map_err(|error| WalkError::emit(entry.path.clone(), error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write as _;

    fn one() -> NonZeroUsize {
        NonZeroUsize::new(1).expect("nonzero")
    }

    fn build_tree(root: &Path) {
        fs::write(root.join("a.txt"), b"a").expect("write a");
        fs::write(root.join("b.txt"), b"b").expect("write b");
        fs::write(root.join("c.txt"), b"c").expect("write c");
        let sub = root.join("sub");
        fs::create_dir(&sub).expect("mkdir");
        fs::write(sub.join("d.txt"), b"d").expect("write d");
        fs::write(sub.join("e.txt"), b"e").expect("write e");
    }

    fn walk_workload(root: &Path, print: PrintLevel) -> Workload {
        Workload::Walk {
            strategy: WalkStrategy::from_name(WalkStrategy::NAMES[0]).expect("name"),
            stat: None,
            root: root.to_path_buf(),
            print,
        }
    }

    #[test]
    fn path_list_accepts_unterminated_trailing_line() {
        let temp = tempfile::tempdir().expect("tempdir");
        let list = temp.path().join("paths.txt");
        let mut file = File::create(&list).expect("create");
        write!(file, "one\ntwo\nthree").expect("write");
        drop(file);

        let paths = load_path_list(&list).expect("load");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("one"),
                PathBuf::from("two"),
                PathBuf::from("three")
            ]
        );
    }

    #[test]
    fn missing_path_list_is_an_input_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let error = match load_path_list(&temp.path().join("gone")) {
            Ok(_) => panic!("missing list should fail"),
            Err(error) => error,
        };
        assert!(matches!(error, HarnessError::Input { .. }));
    }

    #[test]
    fn empty_tree_fails_with_empty_input() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut harness = Harness::new();
        let mut sink = Vec::new();
        let error = harness
            .run(
                &walk_workload(temp.path(), PrintLevel::Silent),
                one(),
                false,
                &mut sink,
            )
            .expect_err("empty tree");
        assert!(matches!(error, HarnessError::EmptyInput));
        assert_eq!(harness.state(), State::Failed);
    }

    #[test]
    fn six_entry_tree_counts_six() {
        let temp = tempfile::tempdir().expect("tempdir");
        build_tree(temp.path());

        let mut harness = Harness::new();
        let mut sink = Vec::new();
        let report = harness
            .run(
                &walk_workload(temp.path(), PrintLevel::Silent),
                one(),
                false,
                &mut sink,
            )
            .expect("run");
        assert_eq!(report.last().entries, 6);
        assert_eq!(harness.state(), State::Completed);
        assert!(sink.is_empty());
    }

    #[test]
    fn one_entry_makes_per_entry_equal_elapsed() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("only"), b"x").expect("write");

        let mut harness = Harness::new();
        let mut sink = Vec::new();
        let report = harness
            .run(
                &walk_workload(temp.path(), PrintLevel::Silent),
                one(),
                false,
                &mut sink,
            )
            .expect("run");
        let pass = report.last();
        assert_eq!(pass.entries, 1);
        assert_eq!(
            u128::from(pass.per_entry_ns),
            pass.elapsed.as_nanos(),
            "a single entry carries the whole pass"
        );
    }

    #[test]
    fn repeat_produces_one_measurement_per_pass() {
        let temp = tempfile::tempdir().expect("tempdir");
        build_tree(temp.path());

        let mut harness = Harness::new();
        let mut sink = Vec::new();
        let report = harness
            .run(
                &walk_workload(temp.path(), PrintLevel::Silent),
                NonZeroUsize::new(3).expect("nonzero"),
                true,
                &mut sink,
            )
            .expect("run");
        assert_eq!(report.passes.len(), 3);
    }

    #[test]
    fn harness_rejects_a_second_run() {
        let temp = tempfile::tempdir().expect("tempdir");
        build_tree(temp.path());

        let mut harness = Harness::new();
        let mut sink = Vec::new();
        let workload = walk_workload(temp.path(), PrintLevel::Silent);
        harness
            .run(&workload, one(), false, &mut sink)
            .expect("first run");
        let error = harness
            .run(&workload, one(), false, &mut sink)
            .expect_err("second run");
        assert!(matches!(error, HarnessError::Exhausted));
    }

    #[test]
    fn stat_workload_counts_every_listed_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        build_tree(temp.path());

        let workload = Workload::Stat {
            strategy: StatStrategy::from_name("stat").expect("name"),
            paths: vec![
                temp.path().join("a.txt"),
                temp.path().join("b.txt"),
                temp.path().join("missing"),
            ],
        };
        let mut harness = Harness::new();
        let mut sink = Vec::new();
        let report = harness
            .run(&workload, one(), false, &mut sink)
            .expect("stat tolerates missing entries");
        assert_eq!(report.last().entries, 3);
    }

    #[test]
    fn cross_validation_passes_on_a_quiet_tree() {
        let temp = tempfile::tempdir().expect("tempdir");
        build_tree(temp.path());

        let workload = Workload::Walk {
            strategy: WalkStrategy::from_name(WalkStrategy::NAMES[0]).expect("name"),
            stat: Some(StatStrategy::from_name("stat").expect("name")),
            root: temp.path().to_path_buf(),
            print: PrintLevel::Silent,
        };
        let mut harness = Harness::new();
        let mut sink = Vec::new();
        let report = harness
            .run(&workload, one(), false, &mut sink)
            .expect("listing and stat agree on an untouched tree");
        assert_eq!(report.last().entries, 6);
    }

    #[test]
    fn print_levels_write_to_the_sink() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("shown"), b"x").expect("write");

        let mut sink = Vec::new();
        Harness::new()
            .run(
                &walk_workload(temp.path(), PrintLevel::Paths),
                one(),
                false,
                &mut sink,
            )
            .expect("run");
        let listing = String::from_utf8(sink).expect("utf8");
        assert!(listing.contains("shown"));
        assert!(!listing.contains("reg "));

        let mut sink = Vec::new();
        Harness::new()
            .run(
                &walk_workload(temp.path(), PrintLevel::Detailed),
                one(),
                false,
                &mut sink,
            )
            .expect("run");
        let listing = String::from_utf8(sink).expect("utf8");
        assert!(listing.contains("reg "));
        assert!(listing.contains(" mod "));
    }
}
