//! POSIX enumeration strategies.

use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use filetime::FileTime;
use rustix::fs::{Dir, FileType, Mode, OFlags};
use timestamp::{EntryTime, Timestamp};

use crate::{Entry, EntryKind, Visitor, WalkError};

/// The POSIX set of mutually exclusive enumeration strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkStrategy {
    /// `std::fs::read_dir`. Each entry's metadata is fetched while listing,
    /// so both timestamps are surfaced incidentally.
    ReadDir,
    /// `getdents` through an owned directory descriptor. Only the entry name
    /// and `d_type` are read; no timestamps are surfaced.
    Dirent,
}

impl WalkStrategy {
    /// Selector names accepted on the command line, in declaration order.
    pub const NAMES: [&'static str; 2] = ["readdir", "dirent"];

    /// Resolves a selector name to its strategy.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "readdir" => Some(Self::ReadDir),
            "dirent" => Some(Self::Dirent),
            _ => None,
        }
    }

    /// Selector name of this strategy.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReadDir => "readdir",
            Self::Dirent => "dirent",
        }
    }

    /// Recursively enumerates `root`, surfacing every entry to `visitor` in
    /// depth-first order.
    pub fn walk(&self, root: &Path, visitor: &mut dyn Visitor) -> Result<(), WalkError> {
        match self {
            Self::ReadDir => walk_read_dir(root, visitor),
            Self::Dirent => walk_dirent(root, visitor),
        }
    }
}

fn walk_read_dir(dir: &Path, visitor: &mut dyn Visitor) -> Result<(), WalkError> {
    let reader =
        fs::read_dir(dir).map_err(|error| WalkError::open_dir(dir.to_path_buf(), error))?;
    for item in reader {
        let item = item.map_err(|error| WalkError::read_entry(dir.to_path_buf(), error))?;
        let path = item.path();
        let file_type = item
            .file_type()
            .map_err(|error| WalkError::metadata(path.clone(), error))?;
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        // Symlink metadata would describe the link, not its target, and the
        // target is what a later stat call reports. Only regular files and
        // directories carry comparable incidental times.
        let times = if kind == EntryKind::Other {
            None
        } else {
            let metadata = item
                .metadata()
                .map_err(|error| WalkError::metadata(path.clone(), error))?;
            Some(entry_time_from_metadata(&metadata))
        };
        let entry = Entry { path, kind, times };
        visitor.entry(&entry)?;
        if entry.kind.is_dir() {
            walk_read_dir(&entry.path, visitor)?;
        }
    }
    Ok(())
}

fn walk_dirent(dir: &Path, visitor: &mut dyn Visitor) -> Result<(), WalkError> {
    let fd = rustix::fs::open(
        dir,
        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC,
        Mode::empty(),
    )
    .map_err(|errno| WalkError::open_dir(dir.to_path_buf(), errno.into()))?;
    let reader = Dir::read_from(&fd)
        .map_err(|errno| WalkError::open_dir(dir.to_path_buf(), errno.into()))?;

    for item in reader {
        let item =
            item.map_err(|errno| WalkError::read_entry(dir.to_path_buf(), errno.into()))?;
        let name = item.file_name();
        let bytes = name.to_bytes();
        if bytes == b"." || bytes == b".." {
            continue;
        }
        let kind = match item.file_type() {
            FileType::Directory => EntryKind::Directory,
            FileType::RegularFile => EntryKind::File,
            // DT_UNKNOWN included: without a follow-up stat there is no way
            // to tell, and this strategy reads nothing beyond the dirent.
            _ => EntryKind::Other,
        };
        let entry = Entry {
            path: dir.join(OsStr::from_bytes(bytes)),
            kind,
            times: None,
        };
        visitor.entry(&entry)?;
        if entry.kind.is_dir() {
            walk_dirent(&entry.path, visitor)?;
        }
    }
    Ok(())
}

fn entry_time_from_metadata(metadata: &fs::Metadata) -> EntryTime {
    let mtime = FileTime::from_last_modification_time(metadata);
    let atime = FileTime::from_last_access_time(metadata);
    EntryTime::new(
        Timestamp::from_unix(mtime.unix_seconds(), mtime.nanoseconds()),
        Timestamp::from_unix(atime.unix_seconds(), atime.nanoseconds()),
    )
}
