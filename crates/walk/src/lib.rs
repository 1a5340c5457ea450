#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` provides the closed set of recursive directory enumeration
//! strategies the timing harness measures against each other. Each strategy
//! lists a directory tree through one specific OS primitive, surfaces every
//! entry to an injected [`Visitor`], and descends depth-first into
//! subdirectories. Some primitives hand out the entry's timestamps as a side
//! effect of listing; those incidental readings are exposed so they can be
//! cross-validated against an explicit stat call on the same path.
//!
//! # Design
//!
//! - [`WalkStrategy`] is a platform-specific enum dispatched through
//!   [`WalkStrategy::walk`]; the interface is identical across platforms so
//!   the harness stays platform-agnostic.
//! - Counting, per-entry stat calls, consistency checking, and printing all
//!   live in the caller's [`Visitor`]; strategies only enumerate. This keeps
//!   the recursion free of shared mutable state.
//! - Directory handles are owned values released on every exit path: the
//!   normal path, the end-of-stream path, and the error path alike.
//!
//! # Invariants
//!
//! - The `.` and `..` pseudo-entries are never surfaced.
//! - A subdirectory is entered only after the visitor has seen its entry.
//! - [`Entry::times`] is `Some` only when the primitive itself exposed
//!   timestamps while listing; it is never synthesised from an extra query.

use std::path::PathBuf;

use timestamp::EntryTime;

mod consistency;
mod error;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::WalkStrategy;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WalkStrategy;

pub use consistency::{ConsistencyError, check_consistency};
pub use error::{WalkError, WalkErrorKind};

/// Classification of one enumerated entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory; the walker descends into it.
    Directory,
    /// Anything else (symlink, socket, device, or unknown to the primitive).
    Other,
}

impl EntryKind {
    /// Returns whether the walker descends into this entry.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Short label used in per-entry listings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::File => "reg",
            Self::Directory => "dir",
            Self::Other => "oth",
        }
    }
}

/// One filesystem entry surfaced during enumeration.
#[derive(Clone, Debug)]
pub struct Entry {
    /// Full path, built by joining the parent directory and the entry name.
    pub path: PathBuf,
    /// Entry classification as reported by the enumeration primitive.
    pub kind: EntryKind,
    /// Timestamps the primitive surfaced incidentally while listing, if any.
    pub times: Option<EntryTime>,
}

/// Receives every enumerated entry, in depth-first order.
pub trait Visitor {
    /// Called once per non-pseudo entry, before the walker descends into it.
    fn entry(&mut self, entry: &Entry) -> Result<(), WalkError>;
}

impl<F> Visitor for F
where
    F: FnMut(&Entry) -> Result<(), WalkError>,
{
    fn entry(&mut self, entry: &Entry) -> Result<(), WalkError> {
        self(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn build_tree(root: &Path) {
        // 3 files and 1 subdirectory containing 2 files: 6 entries total.
        fs::write(root.join("a.txt"), b"a").expect("write a");
        fs::write(root.join("b.txt"), b"b").expect("write b");
        fs::write(root.join("c.txt"), b"c").expect("write c");
        let sub = root.join("sub");
        fs::create_dir(&sub).expect("mkdir");
        fs::write(sub.join("d.txt"), b"d").expect("write d");
        fs::write(sub.join("e.txt"), b"e").expect("write e");
    }

    fn collect(strategy: WalkStrategy, root: &Path) -> Vec<Entry> {
        let mut entries = Vec::new();
        let mut visitor = |entry: &Entry| {
            entries.push(entry.clone());
            Ok(())
        };
        strategy.walk(root, &mut visitor).expect("walk");
        entries
    }

    #[test]
    fn every_strategy_counts_six_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        build_tree(temp.path());

        for name in WalkStrategy::NAMES {
            let strategy = WalkStrategy::from_name(name).expect("known name");
            let entries = collect(strategy, temp.path());
            assert_eq!(entries.len(), 6, "strategy {name}");
            let dirs = entries.iter().filter(|e| e.kind.is_dir()).count();
            assert_eq!(dirs, 1, "strategy {name}");
        }
    }

    #[test]
    fn subdirectory_contents_follow_their_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        build_tree(temp.path());

        for name in WalkStrategy::NAMES {
            let strategy = WalkStrategy::from_name(name).expect("known name");
            let entries = collect(strategy, temp.path());
            let dir_pos = entries
                .iter()
                .position(|e| e.kind.is_dir())
                .expect("subdirectory present");
            let nested: Vec<usize> = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.path.parent() == Some(&temp.path().join("sub")))
                .map(|(i, _)| i)
                .collect();
            assert_eq!(nested.len(), 2, "strategy {name}");
            for index in nested {
                assert!(index > dir_pos, "strategy {name}: depth-first order");
            }
        }
    }

    #[test]
    fn walk_of_missing_root_fails_with_open_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("gone");
        for name in WalkStrategy::NAMES {
            let strategy = WalkStrategy::from_name(name).expect("known name");
            let mut visitor = |_: &Entry| Ok(());
            let error = match strategy.walk(&missing, &mut visitor) {
                Ok(()) => panic!("missing root should fail"),
                Err(error) => error,
            };
            assert!(matches!(error.kind(), WalkErrorKind::OpenDir { .. }));
        }
    }

    #[test]
    fn visitor_error_aborts_the_walk() {
        let temp = tempfile::tempdir().expect("tempdir");
        build_tree(temp.path());

        let mut seen = 0usize;
        let mut visitor = |entry: &Entry| {
            seen += 1;
            Err(WalkError::emit(
                entry.path.clone(),
                std::io::Error::from(std::io::ErrorKind::BrokenPipe),
            ))
        };
        let strategy = WalkStrategy::from_name(WalkStrategy::NAMES[0]).expect("name");
        assert!(strategy.walk(temp.path(), &mut visitor).is_err());
        assert_eq!(seen, 1);
    }

    #[cfg(unix)]
    #[test]
    fn readdir_surfaces_incidental_times_dirent_does_not() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("f"), b"f").expect("write");

        let with_times = collect(WalkStrategy::ReadDir, temp.path());
        assert!(with_times[0].times.is_some());

        let without = collect(WalkStrategy::Dirent, temp.path());
        assert!(without[0].times.is_none());
    }
}
