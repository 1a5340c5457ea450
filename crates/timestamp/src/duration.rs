//! Human-scaled rendering of elapsed intervals and sample averaging.

use std::fmt::{self, Write as _};
use std::time::Duration;

use crate::calendar;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const MONTH: u64 = 31 * DAY;
const YEAR: u64 = 365 * DAY;

/// Writes `d` into `out` using the coarsest meaningful unit.
///
/// The rendered calendar-style fields count elapsed years, months and days
/// (zero-based, unlike wall-clock dates), so one hour renders as
/// `01:00:00 hours` and 400 days as `0001-01-04 00:00:00 years`. When
/// `nanos` is set, a non-zero sub-second remainder is appended as a 9-digit
/// fraction; sub-second intervals render the bare nanosecond count.
pub fn write_duration<W: fmt::Write>(out: &mut W, d: Duration, nanos: bool) -> fmt::Result {
    let t = d.as_secs();
    let civil = calendar::civil_utc(t as i64);

    let unit = if t >= YEAR {
        write!(
            out,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            civil.year - 1970,
            civil.month - 1,
            civil.day - 1,
            civil.hour,
            civil.minute,
            civil.second
        )?;
        "years"
    } else if t >= MONTH {
        write!(
            out,
            "{:02}-{:02} {:02}:{:02}:{:02}",
            civil.month - 1,
            civil.day - 1,
            civil.hour,
            civil.minute,
            civil.second
        )?;
        "months"
    } else if t >= DAY {
        write!(
            out,
            "{:02} {:02}:{:02}:{:02}",
            civil.day - 1,
            civil.hour,
            civil.minute,
            civil.second
        )?;
        "days"
    } else if t >= HOUR {
        write!(
            out,
            "{:02}:{:02}:{:02}",
            civil.hour, civil.minute, civil.second
        )?;
        "hours"
    } else if t >= MINUTE {
        write!(out, "{:02}:{:02}", civil.minute, civil.second)?;
        "minutes"
    } else if t >= 1 {
        write!(out, "{:02}", civil.second)?;
        "seconds"
    } else if nanos {
        "nanoseconds"
    } else {
        "seconds"
    };

    let subsec = d.subsec_nanos();
    if nanos {
        if subsec != 0 {
            if t >= 1 {
                write!(out, ".{subsec:09}")?;
            } else {
                write!(out, "{subsec}")?;
            }
        } else if t == 0 {
            out.write_char('0')?;
        }
    } else if t == 0 {
        out.write_char('0')?;
    }

    write!(out, " {unit}")
}

/// Renders `d` to a fresh string; see [`write_duration`].
#[must_use]
pub fn format_duration(d: Duration, nanos: bool) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_duration(&mut out, d, nanos);
    out
}

/// Integer-truncating arithmetic mean over per-entry averages.
///
/// Accumulates in `u128` so the sum cannot overflow. Returns `0` for an
/// empty slice.
#[must_use]
pub fn average_ns(samples: &[u64]) -> u64 {
    if samples.is_empty() {
        return 0;
    }
    let sum: u128 = samples.iter().map(|&s| u128::from(s)).sum();
    (sum / samples.len() as u128) as u64
}
