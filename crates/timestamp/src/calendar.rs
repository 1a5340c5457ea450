//! Civil calendar conversion for timestamp rendering.
//!
//! UTC conversion is a pure computation (no libc involved) using Howard
//! Hinnant's public-domain civil-date algorithms. Local time goes through
//! `localtime_r` on Unix; elsewhere it falls back to UTC.

use std::io;

/// Broken-down calendar time, analogous to `struct tm` but with 1-based
/// month/day fields and the full year.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CivilTime {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// Day of the year, 1-based (1 = January 1st).
    pub yday: u32,
}

/// Converts a day count (days since 1970-01-01) to a civil date.
///
/// Algorithm from Howard Hinnant's date library (public domain).
pub(crate) fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

/// Converts a civil date to a day count (days since 1970-01-01).
///
/// Inverse of [`civil_from_days`], same source.
pub(crate) fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let m = u64::from(month);
    let d = u64::from(day);
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe as i64 - 719_468
}

/// Breaks Unix seconds into UTC calendar fields.
pub(crate) fn civil_utc(secs: i64) -> CivilTime {
    let days = secs.div_euclid(86_400);
    let day_seconds = secs.rem_euclid(86_400) as u32;
    let (year, month, day) = civil_from_days(days);
    let yday = (days - days_from_civil(year, 1, 1)) as u32 + 1;
    CivilTime {
        year,
        month,
        day,
        hour: day_seconds / 3600,
        minute: (day_seconds % 3600) / 60,
        second: day_seconds % 60,
        yday,
    }
}

/// Breaks Unix seconds into calendar fields in the process's local timezone.
///
/// # Errors
///
/// Fails when the value does not fit the platform `time_t` or when
/// `localtime_r` rejects it. Either case signals environment or libc
/// corruption rather than a user-correctable condition.
#[cfg(unix)]
pub(crate) fn civil_local(secs: i64) -> Result<CivilTime, io::Error> {
    let t = libc::time_t::try_from(secs)
        .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    let mut tm = unsafe { std::mem::zeroed::<libc::tm>() };
    // SAFETY: both pointers are valid for the duration of the call and
    // localtime_r does not retain them.
    let converted = unsafe { libc::localtime_r(&raw const t, &raw mut tm) };
    if converted.is_null() {
        return Err(io::Error::last_os_error());
    }
    Ok(CivilTime {
        year: i64::from(tm.tm_year) + 1900,
        month: tm.tm_mon as u32 + 1,
        day: tm.tm_mday as u32,
        hour: tm.tm_hour as u32,
        minute: tm.tm_min as u32,
        second: tm.tm_sec as u32,
        yday: tm.tm_yday as u32 + 1,
    })
}

#[cfg(not(unix))]
pub(crate) fn civil_local(secs: i64) -> Result<CivilTime, io::Error> {
    Ok(civil_utc(secs))
}
