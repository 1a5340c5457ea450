//! Cross-validation of incidental and stat-observed timestamps.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use timestamp::EntryTime;

/// Checks an enumeration primitive's incidental timestamps against a stat
/// call on the same path.
///
/// Modification times must match exactly. Access times only have to satisfy
/// `observed <= stated`: NTFS defers access-time updates for up to an hour,
/// so a stat taken after the listing may legitimately report a later access
/// time, never an earlier one.
pub fn check_consistency(
    path: &Path,
    observed: &EntryTime,
    stated: &EntryTime,
) -> Result<(), ConsistencyError> {
    if observed.modification == stated.modification && observed.access <= stated.access {
        return Ok(());
    }
    Err(ConsistencyError {
        path: path.to_path_buf(),
        observed: *observed,
        stated: *stated,
    })
}

/// Disagreement between an enumeration primitive and a stat call about one
/// entry's timestamps.
#[derive(Debug)]
pub struct ConsistencyError {
    path: PathBuf,
    observed: EntryTime,
    stated: EntryTime,
}

impl ConsistencyError {
    /// Entry whose timestamps disagree.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Timestamp pair the enumeration primitive surfaced.
    #[must_use]
    pub const fn observed(&self) -> &EntryTime {
        &self.observed
    }

    /// Timestamp pair the stat call reported.
    #[must_use]
    pub const fn stated(&self) -> &EntryTime {
        &self.stated
    }
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamps for '{}' disagree: listing saw mod {} acc {}, stat saw mod {} acc {}",
            self.path.display(),
            self.observed.modification,
            self.observed.access,
            self.stated.modification,
            self.stated.access,
        )
    }
}

impl Error for ConsistencyError {}
