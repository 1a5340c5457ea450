//! POSIX stat strategies.

use std::io;
use std::path::Path;

use rustix::fs::{self, Access, Mode, OFlags};
use rustix::io::Errno;
use timestamp::{EntryTime, Timestamp};

use crate::StatError;

/// The POSIX set of mutually exclusive stat strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatStrategy {
    /// `faccessat(2)` existence probe. The primitive exposes no timestamps,
    /// so the strategy reports `{nonexistent, nonexistent}` by contract.
    Access,
    /// `stat(2)`. Reports both timestamps at nanosecond fidelity and
    /// classifies `ENOENT`/`ENOTDIR` as a nonexistent pair.
    Stat,
    /// `open(2)` followed by `fstat(2)` on the owned descriptor. The
    /// descriptor is released when it goes out of scope, on every exit path.
    Handle,
}

impl StatStrategy {
    /// Selector names accepted on the command line, in declaration order.
    pub const NAMES: [&'static str; 3] = ["access", "stat", "handle"];

    /// Resolves a selector name to its strategy.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "access" => Some(Self::Access),
            "stat" => Some(Self::Stat),
            "handle" => Some(Self::Handle),
            _ => None,
        }
    }

    /// Selector name of this strategy.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Stat => "stat",
            Self::Handle => "handle",
        }
    }

    /// Queries the entry's timestamp pair through this strategy's primitive.
    pub fn entry_time(&self, path: &Path) -> Result<EntryTime, StatError> {
        match self {
            Self::Access => {
                fs::access(path, Access::EXISTS)
                    .map_err(|errno| stat_error("access()", path, errno))?;
                Ok(EntryTime::nonexistent())
            }
            Self::Stat => match fs::stat(path) {
                Ok(st) => Ok(entry_time_from_stat(&st)),
                Err(errno) if errno == Errno::NOENT || errno == Errno::NOTDIR => {
                    Ok(EntryTime::nonexistent())
                }
                Err(errno) => Err(stat_error("stat()", path, errno)),
            },
            Self::Handle => {
                let fd = fs::open(path, OFlags::RDONLY | OFlags::CLOEXEC, Mode::empty())
                    .map_err(|errno| stat_error("open()", path, errno))?;
                let st =
                    fs::fstat(&fd).map_err(|errno| stat_error("fstat()", path, errno))?;
                Ok(entry_time_from_stat(&st))
            }
        }
    }
}

fn stat_error(operation: &'static str, path: &Path, errno: Errno) -> StatError {
    StatError::new(operation, path, io::Error::from(errno))
}

fn entry_time_from_stat(st: &fs::Stat) -> EntryTime {
    EntryTime::new(
        Timestamp::from_unix(st.st_mtime as i64, st.st_mtime_nsec as u32),
        Timestamp::from_unix(st.st_atime as i64, st.st_atime_nsec as u32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::fs::File;

    #[test]
    fn names_round_trip() {
        for name in StatStrategy::NAMES {
            let strategy = StatStrategy::from_name(name).expect("known name");
            assert_eq!(strategy.name(), name);
        }
        assert_eq!(StatStrategy::from_name("fstatat"), None);
    }

    #[test]
    fn access_reports_nonexistent_pair_for_existing_entry() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("probe.txt");
        File::create(&file).expect("create");

        let times = StatStrategy::Access.entry_time(&file).expect("access");
        assert_eq!(times, EntryTime::nonexistent());
    }

    #[test]
    fn access_propagates_missing_entry_as_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let error = match StatStrategy::Access.entry_time(&temp.path().join("gone")) {
            Ok(_) => panic!("missing path should fail"),
            Err(error) => error,
        };
        assert_eq!(error.operation(), "access()");
        assert_eq!(error.os_error(), Some(libc_enoent()));
    }

    #[test]
    fn stat_recovers_planted_times() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("dated.txt");
        File::create(&file).expect("create");
        let atime = FileTime::from_unix_time(1_700_000_000, 111_000_000);
        let mtime = FileTime::from_unix_time(1_700_000_100, 222_000_000);
        filetime::set_file_times(&file, atime, mtime).expect("set times");

        let times = StatStrategy::Stat.entry_time(&file).expect("stat");
        assert_eq!(
            times.modification,
            Timestamp::from_unix(1_700_000_100, 222_000_000)
        );
        assert_eq!(
            times.access,
            Timestamp::from_unix(1_700_000_000, 111_000_000)
        );
    }

    #[test]
    fn stat_classifies_missing_entry_as_nonexistent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let times = StatStrategy::Stat
            .entry_time(&temp.path().join("gone"))
            .expect("missing is not an error for stat");
        assert_eq!(times, EntryTime::nonexistent());

        // ENOTDIR: a path component that is a regular file.
        let file = temp.path().join("plain");
        File::create(&file).expect("create");
        let times = StatStrategy::Stat
            .entry_time(&file.join("below"))
            .expect("ENOTDIR maps to nonexistent");
        assert_eq!(times, EntryTime::nonexistent());
    }

    #[test]
    fn handle_matches_stat_and_rejects_missing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("dated.txt");
        File::create(&file).expect("create");
        let mtime = FileTime::from_unix_time(1_650_000_000, 42);
        filetime::set_file_mtime(&file, mtime).expect("set mtime");

        let by_handle = StatStrategy::Handle.entry_time(&file).expect("handle");
        let by_stat = StatStrategy::Stat.entry_time(&file).expect("stat");
        assert_eq!(by_handle.modification, by_stat.modification);

        let error = match StatStrategy::Handle.entry_time(&temp.path().join("gone")) {
            Ok(_) => panic!("missing path should fail for the handle strategy"),
            Err(error) => error,
        };
        assert_eq!(error.operation(), "open()");
    }

    #[test]
    fn handle_works_for_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let times = StatStrategy::Handle.entry_time(temp.path()).expect("dir");
        assert!(!times.modification.is_sentinel());
    }

    fn libc_enoent() -> i32 {
        Errno::NOENT.raw_os_error()
    }
}
