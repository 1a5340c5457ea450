use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::consistency::ConsistencyError;
use stat::StatError;

/// Error returned when an enumeration pass fails.
#[derive(Debug)]
pub struct WalkError {
    kind: WalkErrorKind,
}

impl WalkError {
    pub(crate) fn new(kind: WalkErrorKind) -> Self {
        Self { kind }
    }

    pub(crate) fn open_dir(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::OpenDir { path, source })
    }

    pub(crate) fn read_entry(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::ReadEntry { path, source })
    }

    pub(crate) fn metadata(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Metadata { path, source })
    }

    /// Wraps a failure to write a per-entry listing line.
    #[must_use]
    pub fn emit(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Emit { path, source })
    }

    /// Returns the specific failure that terminated the pass.
    #[must_use]
    pub fn kind(&self) -> &WalkErrorKind {
        &self.kind
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WalkErrorKind::OpenDir { path, source } => {
                write!(
                    f,
                    "failed to open directory '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::ReadEntry { path, source } => {
                write!(
                    f,
                    "failed to read entry in '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::Metadata { path, source } => {
                write!(
                    f,
                    "failed to inspect metadata for '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::Emit { path, source } => {
                write!(f, "failed to list entry '{}': {}", path.display(), source)
            }
            WalkErrorKind::Stat(source) => source.fmt(f),
            WalkErrorKind::Consistency(source) => source.fmt(f),
        }
    }
}

impl Error for WalkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            WalkErrorKind::OpenDir { source, .. }
            | WalkErrorKind::ReadEntry { source, .. }
            | WalkErrorKind::Metadata { source, .. }
            | WalkErrorKind::Emit { source, .. } => Some(source),
            WalkErrorKind::Stat(source) => Some(source),
            WalkErrorKind::Consistency(source) => Some(source),
        }
    }
}

impl From<StatError> for WalkError {
    fn from(source: StatError) -> Self {
        Self::new(WalkErrorKind::Stat(source))
    }
}

impl From<ConsistencyError> for WalkError {
    fn from(source: ConsistencyError) -> Self {
        Self::new(WalkErrorKind::Consistency(source))
    }
}

/// Classification of enumeration failures.
#[derive(Debug)]
pub enum WalkErrorKind {
    /// The directory could not be opened for listing.
    OpenDir {
        /// Directory that failed to open.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// The listing primitive failed before its end-of-stream signal.
    ReadEntry {
        /// Directory whose listing failed.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// The primitive could not provide metadata for an entry.
    Metadata {
        /// Entry whose metadata could not be retrieved.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// A per-entry listing line could not be written.
    Emit {
        /// Entry whose listing line failed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The per-entry stat call requested by the visitor failed.
    Stat(StatError),
    /// Incidental and stat-observed timestamps disagree.
    Consistency(ConsistencyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn io_error(message: &'static str) -> io::Error {
        io::Error::other(message)
    }

    #[test]
    fn display_is_specific_per_variant() {
        let open = WalkError::open_dir(PathBuf::from("dir"), io_error("boom"));
        assert_eq!(open.to_string(), "failed to open directory 'dir': boom");

        let read = WalkError::read_entry(PathBuf::from("dir"), io_error("boom"));
        assert_eq!(read.to_string(), "failed to read entry in 'dir': boom");

        let metadata = WalkError::metadata(PathBuf::from("entry"), io_error("boom"));
        assert_eq!(
            metadata.to_string(),
            "failed to inspect metadata for 'entry': boom"
        );
    }

    #[test]
    fn stat_errors_convert_and_expose_a_source() {
        let stat_error = stat::StatStrategy::from_name(stat::StatStrategy::NAMES[0])
            .expect("name")
            .entry_time(Path::new("./definitely/missing/path"))
            .expect_err("missing path");
        let error = WalkError::from(stat_error);
        assert!(matches!(error.kind(), WalkErrorKind::Stat(_)));
        assert!(error.source().is_some());
    }
}
