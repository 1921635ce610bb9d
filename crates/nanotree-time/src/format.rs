#![forbid(unsafe_code)]

//! Tick, context, and duration labels.
//!
//! Tick labels show only what changes between neighbouring ticks: a non-zero
//! sub-millisecond remainder is printed verbatim (`"789ns"`, `"456µs"`),
//! otherwise the instant is formatted at the finest calendar unit it is not
//! aligned to (`".023"`, `":30"`, `"11 PM"`, `"December"`).
//!
//! Context labels show what every instant of a domain has in common, so an
//! axis zoomed to a few nanoseconds still says which day it is on.

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::Nanos;
use crate::calendar::{
    CalendarUnit, NANOS_PER_DAY, NANOS_PER_HOUR, NANOS_PER_MICRO, NANOS_PER_MILLI,
    NANOS_PER_MINUTE, NANOS_PER_SECOND, NANOS_PER_YEAR, to_datetime,
};
use crate::scale::TimeScaleError;

/// Calendar datetime of the millisecond containing `ns`.
fn millisecond_datetime(ns: Nanos, offset: UtcOffset) -> Result<OffsetDateTime, TimeScaleError> {
    to_datetime(ns.div_euclid(NANOS_PER_MILLI) * NANOS_PER_MILLI, offset)
}

/// Label for a single tick at `ns`.
pub fn tick_format(ns: Nanos, offset: UtcOffset) -> Result<String, TimeScaleError> {
    let nano = ns.rem_euclid(NANOS_PER_MICRO);
    if nano != 0 {
        return Ok(format!("{nano:03}ns"));
    }
    let micro = ns.rem_euclid(NANOS_PER_MILLI) / NANOS_PER_MICRO;
    if micro != 0 {
        return Ok(format!("{micro:03}µs"));
    }
    let t = millisecond_datetime(ns, offset)?;
    format_date_tick(t)
}

fn format_date_tick(t: OffsetDateTime) -> Result<String, TimeScaleError> {
    let unaligned = |unit: CalendarUnit| unit.floor(t) < t;
    let description = if unaligned(CalendarUnit::Second) {
        format_description!(".[subsecond digits:3]")
    } else if unaligned(CalendarUnit::Minute) {
        format_description!(":[second]")
    } else if unaligned(CalendarUnit::Hour) {
        format_description!("[hour repr:12]:[minute]")
    } else if unaligned(CalendarUnit::Day) {
        format_description!("[hour repr:12] [period]")
    } else if unaligned(CalendarUnit::Month) {
        if unaligned(CalendarUnit::Week) {
            format_description!("[weekday repr:short] [day]")
        } else {
            format_description!("[month repr:short] [day]")
        }
    } else if unaligned(CalendarUnit::Year) {
        format_description!("[month repr:long]")
    } else {
        format_description!("[year]")
    };
    Ok(t.format(description)?)
}

/// Label for what both domain endpoints share, coarsest unit last.
///
/// Endpoints inside the same millisecond get the full datetime followed by
/// the leading sub-millisecond digits they share (up to five). Endpoints in
/// different years share nothing and yield `None`.
pub fn context_format(
    domain: [Nanos; 2],
    offset: UtcOffset,
) -> Result<Option<String>, TimeScaleError> {
    let [t0, t1] = domain;
    let d0 = millisecond_datetime(t0, offset)?;
    let d1 = millisecond_datetime(t1, offset)?;

    let rest0 = format!("{:06}", t0.rem_euclid(NANOS_PER_MILLI));
    let rest1 = format!("{:06}", t1.rem_euclid(NANOS_PER_MILLI));
    if d0 == d1 && rest0 != rest1 {
        let shared: String = rest0
            .chars()
            .zip(rest1.chars())
            .take(5)
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a)
            .collect();
        let head = d0.format(format_description!(
            "[weekday repr:short] [month repr:short] [day padding:none], [year] ([hour repr:12 padding:none]:[minute]:[second].[subsecond digits:3]"
        ))?;
        let tail = d0.format(format_description!(" [period])"))?;
        return Ok(Some(format!("{head}{shared}{tail}")));
    }

    const SHARED_UNITS: [CalendarUnit; 7] = [
        CalendarUnit::Millisecond,
        CalendarUnit::Second,
        CalendarUnit::Minute,
        CalendarUnit::Hour,
        CalendarUnit::Day,
        CalendarUnit::Month,
        CalendarUnit::Year,
    ];
    let Some(unit) = SHARED_UNITS
        .into_iter()
        .find(|unit| unit.floor(d0) == unit.floor(d1))
    else {
        return Ok(None);
    };

    let description = match unit {
        CalendarUnit::Millisecond => format_description!(
            "[weekday repr:short] [month repr:short] [day padding:none], [year] ([hour repr:12 padding:none]:[minute]:[second].[subsecond digits:3] [period])"
        ),
        CalendarUnit::Second => format_description!(
            "[weekday repr:short] [month repr:short] [day padding:none], [year] ([hour repr:12 padding:none]:[minute]:[second] [period])"
        ),
        CalendarUnit::Minute => format_description!(
            "[weekday repr:short] [month repr:short] [day padding:none], [year] ([hour repr:12 padding:none]:[minute] [period])"
        ),
        CalendarUnit::Hour => format_description!(
            "[weekday repr:short] [month repr:short] [day padding:none], [year] ([hour repr:12 padding:none][period])"
        ),
        CalendarUnit::Day | CalendarUnit::Week => format_description!(
            "[weekday repr:short] [month repr:short] [day padding:none], [year]"
        ),
        CalendarUnit::Month => format_description!("[month repr:long] [year]"),
        CalendarUnit::Year => format_description!("[year]"),
    };
    Ok(Some(d0.format(description)?))
}

const DURATION_UNITS: [(Nanos, &str); 8] = [
    (NANOS_PER_YEAR, "years"),
    (NANOS_PER_DAY, "days"),
    (NANOS_PER_HOUR, "hours"),
    (NANOS_PER_MINUTE, "min"),
    (NANOS_PER_SECOND, "s"),
    (NANOS_PER_MILLI, "ms"),
    (NANOS_PER_MICRO, "µs"),
    (1, "ns"),
];

/// Human label for a length of time, in the largest unit it fills.
///
/// Two decimals at most, trailing zeros dropped, and no decimals at all from
/// 100 upward: `"146 years"`, `"13.03 days"`, `"256 ns"`.
#[must_use]
pub fn format_duration(ns: Nanos) -> String {
    let magnitude = ns.unsigned_abs();
    let sign = if ns < 0 { "-" } else { "" };
    let (unit, name) = DURATION_UNITS
        .into_iter()
        .find(|&(unit, _)| magnitude >= unit.unsigned_abs())
        .unwrap_or((1, "ns"));
    let value = magnitude as f64 / unit as f64;
    let number = if value >= 100.0 {
        format!("{value:.0}")
    } else {
        let fixed = format!("{value:.2}");
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    };
    format!("{sign}{number} {name}")
}
