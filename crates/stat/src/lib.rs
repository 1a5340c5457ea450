#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `stat` exposes the closed set of strategies that map one filesystem path
//! to its [`timestamp::EntryTime`] via one specific OS primitive each. The point of the
//! crate is not to pick the best primitive but to make the alternatives
//! individually selectable, so the timing harness can compare their
//! per-entry cost and the consistency checker can cross-validate their
//! answers.
//!
//! # Design
//!
//! - [`StatStrategy`] is a platform-specific enum; exactly one variant is
//!   active per run. All variants answer through
//!   [`StatStrategy::entry_time`], so the harness and the checker are
//!   platform-agnostic.
//! - Strategies deliberately differ in timestamp fidelity. The lightweight
//!   attribute-only probe cannot produce timestamps and reports
//!   `{nonexistent, nonexistent}` by contract; richer primitives report both
//!   timestamps at full resolution. This asymmetry documents what each real
//!   OS primitive actually exposes and is preserved on purpose.
//! - Only the `stat`-style variant classifies a missing entry as
//!   `{nonexistent, nonexistent}`, because only its primitive distinguishes
//!   "missing" from "other failure". The other variants propagate the OS
//!   failure as a [`StatError`].
//!
//! # Errors
//!
//! Every primitive failure is translated at the call site into a
//! [`StatError`] carrying the primitive's name, the path, and the OS error.
//! Nothing is retried or locally recovered.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::StatStrategy;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::StatStrategy;

/// Error returned when a stat strategy's underlying primitive fails.
#[derive(Debug, Error)]
#[error("{operation} failed for '{}': {source}", path.display())]
pub struct StatError {
    operation: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl StatError {
    pub(crate) fn new(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Name of the OS primitive that failed.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Path the primitive was queried with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw OS error code, when the failure originated in the OS.
    #[must_use]
    pub fn os_error(&self) -> Option<i32> {
        self.source.raw_os_error()
    }
}
