//! Format-string rendering for [`Timestamp`] values.
//!
//! The format language is a strftime-style directive stream extended with
//! one custom directive, `%[dN]`, which renders the nanosecond remainder
//! preceded by the optional single separator character `d` when the
//! remainder is non-zero, and nothing when it is zero. Escapes (`%%`) are
//! honoured while scanning, and unrecognised directives pass through
//! verbatim.

use std::fmt::{self, Write as _};
use std::io;

use thiserror::Error;

use crate::Timestamp;
use crate::calendar::{self, CivilTime};

/// Capacity of the fixed format buffer; longer format strings are rejected.
pub const MAX_FORMAT_LEN: usize = 256;

/// Options controlling one rendering pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    /// Render the reserved constants as their literal tags instead of
    /// attempting calendar conversion.
    pub allow_sentinels: bool,
    /// Convert to the process's local timezone instead of UTC.
    pub local_time: bool,
    /// Field width inherited from the surrounding formatter state, if any.
    ///
    /// The renderer never applies it; it exists so that a caller-requested
    /// pad can be rejected in combination with the nanosecond directive
    /// rather than silently mangling the remainder.
    pub width: Option<usize>,
}

/// Error raised while rendering a timestamp.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The format string does not fit the fixed buffer.
    #[error("format string length {len} exceeds the {MAX_FORMAT_LEN}-byte capacity")]
    Overflow {
        /// Length of the rejected format string in bytes.
        len: usize,
    },
    /// A `%[` directive ended before its `N` marker.
    #[error("nanosecond directive is missing its 'N' marker")]
    MissingMarker,
    /// A `%[dN` directive ended before its closing bracket.
    #[error("nanosecond directive is missing its closing ']'")]
    Unterminated,
    /// A field width was combined with the nanosecond directive.
    #[error("padding is not supported when printing nanoseconds")]
    PaddedNanoseconds,
    /// A sentinel value was rendered without sentinel tags enabled.
    #[error("cannot render reserved timestamp {tag} as calendar time")]
    Sentinel {
        /// Literal tag of the offending sentinel.
        tag: &'static str,
    },
    /// Local calendar conversion failed; the process environment is corrupt.
    #[error("local time conversion failed: {source}")]
    Calendar {
        /// Underlying OS failure.
        #[source]
        source: io::Error,
    },
    /// The output sink rejected a write.
    #[error("failed to write rendered timestamp")]
    Write(#[from] fmt::Error),
}

pub(crate) fn write_timestamp<W: fmt::Write>(
    out: &mut W,
    ts: &Timestamp,
    format: &str,
    options: &RenderOptions,
) -> Result<(), FormatError> {
    if format.len() + 1 > MAX_FORMAT_LEN {
        return Err(FormatError::Overflow { len: format.len() });
    }

    if let Some(tag) = ts.sentinel_tag() {
        if options.allow_sentinels {
            out.write_str(tag)?;
            return Ok(());
        }
        return Err(FormatError::Sentinel { tag });
    }

    // Sentinels were handled above, so both components are present.
    let secs = ts.unix_seconds().unwrap_or(0);
    let subsec = ts.subsec_nanos().unwrap_or(0);

    let civil = if options.local_time {
        calendar::civil_local(secs).map_err(|source| FormatError::Calendar { source })?
    } else {
        calendar::civil_utc(secs)
    };

    expand(out, format, &civil, secs, subsec, options)
}

/// Walks the directive stream, expanding each `%X` chunk.
fn expand<W: fmt::Write>(
    out: &mut W,
    format: &str,
    civil: &CivilTime,
    secs: i64,
    subsec: u32,
    options: &RenderOptions,
) -> Result<(), FormatError> {
    let mut chars = format.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.write_char(ch)?;
            continue;
        }

        match chars.next() {
            Some('[') => {
                if options.width.is_some() {
                    return Err(FormatError::PaddedNanoseconds);
                }

                let separator = match chars.next() {
                    None => return Err(FormatError::MissingMarker),
                    Some('N') => None,
                    Some(d) => {
                        if chars.next() != Some('N') {
                            return Err(FormatError::MissingMarker);
                        }
                        Some(d)
                    }
                };
                if chars.next() != Some(']') {
                    return Err(FormatError::Unterminated);
                }

                if subsec != 0 {
                    if let Some(d) = separator {
                        out.write_char(d)?;
                    }
                    write!(out, "{subsec:09}")?;
                }
            }
            Some(directive) => write_directive(out, directive, civil, secs)?,
            None => {
                // Trailing percent with no directive character.
                out.write_char('%')?;
            }
        }
    }

    Ok(())
}

fn write_directive<W: fmt::Write>(
    out: &mut W,
    directive: char,
    civil: &CivilTime,
    secs: i64,
) -> Result<(), FormatError> {
    match directive {
        'Y' => write!(out, "{:04}", civil.year)?,
        'y' => write!(out, "{:02}", civil.year.rem_euclid(100))?,
        'm' => write!(out, "{:02}", civil.month)?,
        'd' => write!(out, "{:02}", civil.day)?,
        'e' => write!(out, "{:2}", civil.day)?,
        'H' => write!(out, "{:02}", civil.hour)?,
        'M' => write!(out, "{:02}", civil.minute)?,
        'S' => write!(out, "{:02}", civil.second)?,
        'j' => write!(out, "{:03}", civil.yday)?,
        's' => write!(out, "{secs}")?,
        'F' => write!(
            out,
            "{:04}-{:02}-{:02}",
            civil.year, civil.month, civil.day
        )?,
        'T' => write!(
            out,
            "{:02}:{:02}:{:02}",
            civil.hour, civil.minute, civil.second
        )?,
        'R' => write!(out, "{:02}:{:02}", civil.hour, civil.minute)?,
        '%' => out.write_char('%')?,
        other => {
            // Unknown directive: pass through verbatim.
            out.write_char('%')?;
            out.write_char(other)?;
        }
    }
    Ok(())
}
