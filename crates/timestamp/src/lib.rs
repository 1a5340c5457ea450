#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `timestamp` provides the point-in-time model shared by every stat and
//! enumeration strategy in the fsbench workspace. Operating systems hand out
//! file times in incompatible encodings: POSIX `stat` reports seconds since
//! the Unix epoch plus a nanosecond remainder, while the Win32 family reports
//! 100-nanosecond ticks since 1601. [`Timestamp`] unifies both into a single
//! comparable nanosecond-resolution value so that timestamps obtained through
//! different primitives can be cross-checked for consistency.
//!
//! # Design
//!
//! - [`Timestamp`] stores real clock readings as an `i128` count of
//!   nanoseconds since the Unix epoch, wide enough that any 64-bit native
//!   tick value converts without overflow in either direction.
//! - Three reserved constants ([`Timestamp::UNKNOWN`],
//!   [`Timestamp::NONEXISTENT`], [`Timestamp::UNREAL`]) signal "not a real
//!   time". They are dedicated variants rather than magic in-band values, so
//!   they compare unequal to every clock reading including the epoch itself.
//! - [`EntryTime`] pairs the modification and access timestamps of one
//!   filesystem entry; it is the unit exchanged between strategies and the
//!   consistency checker.
//! - Rendering goes through a strftime-style format string extended with the
//!   `%[dN]` directive for the nanosecond remainder; see
//!   [`Timestamp::write_to`].
//!
//! # Invariants
//!
//! - The sentinels are pairwise distinct and distinct from any value built by
//!   [`Timestamp::from_unix`] or [`Timestamp::from_native_ticks`].
//! - Ordering is total. Sentinels order below every real reading; among real
//!   readings the order is chronological.
//! - [`Timestamp::subsec_nanos`] is always in `0..1_000_000_000`, also for
//!   pre-epoch readings.

use std::fmt;

mod calendar;
mod duration;
mod render;

pub use duration::{average_ns, format_duration, write_duration};
pub use render::{FormatError, MAX_FORMAT_LEN, RenderOptions};

/// Nanoseconds per second.
const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Seconds between 1601-01-01T00:00:00Z and 1970-01-01T00:00:00Z.
///
/// The Win32 FILETIME epoch predates the Unix epoch by this many seconds.
const WINDOWS_EPOCH_OFFSET_SECS: i128 = 11_644_473_600;

/// Format used by the [`fmt::Display`] implementation of [`Timestamp`].
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%[.N]";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Repr {
    // Variant order puts the sentinels below every real reading so the
    // derived `Ord` stays total.
    Unknown,
    Nonexistent,
    Unreal,
    At(i128),
}

/// An opaque point in time with nanosecond-resolution storage.
///
/// Values are created fresh per query and never mutated. Comparisons are
/// chronological for real readings; the reserved sentinels compare below all
/// of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Repr);

impl Timestamp {
    /// The value is not available from the queried primitive.
    pub const UNKNOWN: Self = Self(Repr::Unknown);

    /// The entry's time attribute does not exist, typically because the entry
    /// itself vanished between enumeration and stat.
    pub const NONEXISTENT: Self = Self(Repr::Nonexistent);

    /// The value is structurally present but not meaningful.
    pub const UNREAL: Self = Self(Repr::Unreal);

    /// Builds a timestamp from POSIX seconds since the epoch plus a
    /// sub-second nanosecond remainder.
    #[must_use]
    pub const fn from_unix(secs: i64, subsec_ns: u32) -> Self {
        Self(Repr::At(secs as i128 * NANOS_PER_SEC + subsec_ns as i128))
    }

    /// Builds a timestamp from a 64-bit count of 100-nanosecond ticks since
    /// 1601-01-01T00:00:00Z, split into its high and low 32-bit halves the
    /// way the Win32 FILETIME structure stores them.
    ///
    /// The epoch shift and the tick-to-nanosecond scaling are performed in
    /// `i128`, so every representable tick value converts exactly.
    #[must_use]
    pub const fn from_native_ticks(high: u32, low: u32) -> Self {
        let ticks = ((high as u64) << 32) | low as u64;
        let unix_ticks = ticks as i128 - WINDOWS_EPOCH_OFFSET_SECS * 10_000_000;
        Self(Repr::At(unix_ticks * 100))
    }

    /// Returns whether this value is one of the three reserved sentinels.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        !matches!(self.0, Repr::At(_))
    }

    /// Returns the fixed literal tag for a sentinel value.
    #[must_use]
    pub const fn sentinel_tag(&self) -> Option<&'static str> {
        match self.0 {
            Repr::Unknown => Some("<unknown>"),
            Repr::Nonexistent => Some("<nonexistent>"),
            Repr::Unreal => Some("<unreal>"),
            Repr::At(_) => None,
        }
    }

    /// Returns the whole-second component of a real reading, or `None` for a
    /// sentinel.
    #[must_use]
    pub fn unix_seconds(&self) -> Option<i64> {
        match self.0 {
            Repr::At(nanos) => Some(nanos.div_euclid(NANOS_PER_SEC) as i64),
            _ => None,
        }
    }

    /// Returns the sub-second nanosecond remainder of a real reading, always
    /// in `0..1_000_000_000`, or `None` for a sentinel.
    #[must_use]
    pub fn subsec_nanos(&self) -> Option<u32> {
        match self.0 {
            Repr::At(nanos) => Some(nanos.rem_euclid(NANOS_PER_SEC) as u32),
            _ => None,
        }
    }

    /// Renders the timestamp into `out` according to `format`.
    ///
    /// `format` supports the common strftime calendar directives (`%Y %y %m
    /// %d %e %H %M %S %F %T %R %j %s`), the `%%` escape, and the custom
    /// directive `%[dN]`: the nanosecond remainder, preceded by the single
    /// separator character `d` when the remainder is non-zero, and nothing at
    /// all when the remainder is zero. The separator is optional (`%[N]`).
    /// Unrecognised directives pass through verbatim.
    ///
    /// With [`RenderOptions::allow_sentinels`] set, the reserved constants
    /// render as their fixed literal tags and no calendar conversion is
    /// attempted; without it, rendering a sentinel is a [`FormatError`].
    ///
    /// # Errors
    ///
    /// Fails when the format string is malformed or longer than
    /// [`MAX_FORMAT_LEN`], when an inherited field width is combined with the
    /// nanosecond directive (padding nanoseconds is rejected, not ignored),
    /// or when local calendar conversion fails. The latter signals a corrupt
    /// environment rather than a user mistake and should terminate the
    /// process.
    pub fn write_to<W: fmt::Write>(
        &self,
        out: &mut W,
        format: &str,
        options: &RenderOptions,
    ) -> Result<(), FormatError> {
        render::write_timestamp(out, self, format, options)
    }
}

impl fmt::Display for Timestamp {
    /// Renders as local calendar time with sentinel tags allowed.
    ///
    /// A field width on the formatter is forwarded to the renderer, which
    /// rejects it in combination with the nanosecond directive.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = RenderOptions {
            allow_sentinels: true,
            local_time: true,
            width: f.width(),
        };
        let mut rendered = String::new();
        self.write_to(&mut rendered, DISPLAY_FORMAT, &options)
            .map_err(|_| fmt::Error)?;
        f.pad(&rendered)
    }
}

/// The `{modification, access}` timestamp pair of one filesystem entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryTime {
    /// Last modification time.
    pub modification: Timestamp,
    /// Last access time.
    pub access: Timestamp,
}

impl EntryTime {
    /// Builds an entry-time pair.
    #[must_use]
    pub const fn new(modification: Timestamp, access: Timestamp) -> Self {
        Self {
            modification,
            access,
        }
    }

    /// The pair reported by primitives whose time attributes do not exist.
    #[must_use]
    pub const fn nonexistent() -> Self {
        Self::new(Timestamp::NONEXISTENT, Timestamp::NONEXISTENT)
    }
}
