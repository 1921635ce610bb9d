#![forbid(unsafe_code)]

//! Calendar units and intervals at a fixed UTC offset.
//!
//! Instants are `i128` nanoseconds since the Unix epoch; calendar math runs on
//! [`OffsetDateTime`] in the scale's configured offset. Weeks start on Sunday.
//! Month and year lengths are nominal (30 and 365 days) only when choosing a
//! tick interval; the intervals themselves follow the real calendar.

use time::macros::datetime;
use time::{Date, Duration, Month, OffsetDateTime, Time, UtcOffset};

use crate::Nanos;
use crate::scale::TimeScaleError;
use crate::ticks::tick_step;

pub const NANOS_PER_MICRO: Nanos = 1_000;
pub const NANOS_PER_MILLI: Nanos = 1_000_000;
pub const NANOS_PER_SECOND: Nanos = 1_000_000_000;
pub const NANOS_PER_MINUTE: Nanos = 60 * NANOS_PER_SECOND;
pub const NANOS_PER_HOUR: Nanos = 60 * NANOS_PER_MINUTE;
pub const NANOS_PER_DAY: Nanos = 24 * NANOS_PER_HOUR;
pub const NANOS_PER_WEEK: Nanos = 7 * NANOS_PER_DAY;
pub const NANOS_PER_MONTH: Nanos = 30 * NANOS_PER_DAY;
pub const NANOS_PER_YEAR: Nanos = 365 * NANOS_PER_DAY;

/// Upper bound on instants visited while enumerating one tick sequence.
pub const MAX_TICK_CANDIDATES: usize = 1 << 20;

/// Calendar granularity, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CalendarUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl CalendarUnit {
    pub const ALL: [CalendarUnit; 8] = [
        Self::Millisecond,
        Self::Second,
        Self::Minute,
        Self::Hour,
        Self::Day,
        Self::Week,
        Self::Month,
        Self::Year,
    ];

    /// Nominal length used to compare intervals.
    #[must_use]
    pub const fn nominal_nanos(self) -> Nanos {
        match self {
            Self::Millisecond => NANOS_PER_MILLI,
            Self::Second => NANOS_PER_SECOND,
            Self::Minute => NANOS_PER_MINUTE,
            Self::Hour => NANOS_PER_HOUR,
            Self::Day => NANOS_PER_DAY,
            Self::Week => NANOS_PER_WEEK,
            Self::Month => NANOS_PER_MONTH,
            Self::Year => NANOS_PER_YEAR,
        }
    }

    /// Start of the unit containing `t`.
    #[must_use]
    pub fn floor(self, t: OffsetDateTime) -> OffsetDateTime {
        let sub_second = Duration::nanoseconds(i64::from(t.nanosecond()));
        match self {
            Self::Millisecond => {
                t - Duration::nanoseconds(i64::from(t.nanosecond() % 1_000_000))
            }
            Self::Second => t - sub_second,
            Self::Minute => t - sub_second - Duration::seconds(i64::from(t.second())),
            Self::Hour => {
                let elapsed = i64::from(t.minute()) * 60 + i64::from(t.second());
                t - sub_second - Duration::seconds(elapsed)
            }
            Self::Day => t.replace_time(Time::MIDNIGHT),
            Self::Week => {
                let back = t.weekday().number_days_from_sunday();
                Self::Day.floor(t) - Duration::days(i64::from(back))
            }
            Self::Month => Self::Day.floor(t) - Duration::days(i64::from(t.day()) - 1),
            Self::Year => Self::Day.floor(t) - Duration::days(i64::from(t.ordinal()) - 1),
        }
    }

    /// Whether `t` sits exactly on a unit boundary.
    #[must_use]
    pub fn is_aligned(self, t: OffsetDateTime) -> bool {
        self.floor(t) == t
    }

    /// `t` moved by `steps` whole units.
    #[must_use]
    pub fn offset(self, t: OffsetDateTime, steps: i64) -> Option<OffsetDateTime> {
        match self {
            Self::Millisecond => t.checked_add(Duration::milliseconds(steps)),
            Self::Second => t.checked_add(Duration::seconds(steps)),
            Self::Minute => t.checked_add(Duration::minutes(steps)),
            Self::Hour => t.checked_add(Duration::hours(steps)),
            Self::Day => t.checked_add(Duration::days(steps)),
            Self::Week => t.checked_add(Duration::weeks(steps)),
            Self::Month => add_months(t, steps),
            Self::Year => add_months(t, steps.checked_mul(12)?),
        }
    }

    /// Position of `t` used to thin a unit down to every `n`th boundary.
    ///
    /// Fields restart with their parent unit (seconds within the minute, days
    /// within the month), except milliseconds and weeks which count from the
    /// epoch.
    #[must_use]
    pub fn field(self, t: OffsetDateTime) -> i64 {
        match self {
            Self::Millisecond => {
                i64::try_from(t.unix_timestamp_nanos().div_euclid(NANOS_PER_MILLI))
                    .unwrap_or_default()
            }
            Self::Second => i64::from(t.second()),
            Self::Minute => i64::from(t.minute()),
            Self::Hour => i64::from(t.hour()),
            Self::Day => i64::from(t.day()) - 1,
            Self::Week => {
                let epoch_sunday = datetime!(1970-01-04 0:00 UTC).replace_offset(t.offset());
                (Self::Week.floor(t) - epoch_sunday).whole_days().div_euclid(7)
            }
            Self::Month => i64::from(u8::from(t.month())) - 1,
            Self::Year => i64::from(t.year()),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Millisecond => "millisecond",
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

fn add_months(t: OffsetDateTime, months: i64) -> Option<OffsetDateTime> {
    let index = i64::from(t.year()) * 12 + i64::from(u8::from(t.month())) - 1;
    let index = index.checked_add(months)?;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?).ok()?;
    // Short months clamp the day (Jan 31 + 1 month = Feb 28/29).
    let date = (0..4).find_map(|back| {
        Date::from_calendar_date(year, month, t.day().saturating_sub(back)).ok()
    })?;
    Some(t.replace_date(date))
}

/// Every `step`th boundary of a calendar unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarInterval {
    pub unit: CalendarUnit,
    pub step: u32,
}

impl CalendarInterval {
    #[must_use]
    pub const fn new(unit: CalendarUnit, step: u32) -> Self {
        Self { unit, step }
    }

    /// Whether `t` (already aligned to the unit) is one of the kept
    /// boundaries.
    #[must_use]
    pub fn accepts(&self, t: OffsetDateTime) -> bool {
        self.step <= 1 || self.unit.field(t).rem_euclid(i64::from(self.step)) == 0
    }

    /// Latest kept boundary at or before `t`.
    #[must_use]
    pub fn floor(&self, t: OffsetDateTime) -> Option<OffsetDateTime> {
        let mut current = self.unit.floor(t);
        while !self.accepts(current) {
            current = self.unit.offset(current, -1)?;
        }
        Some(current)
    }

    /// Earliest kept boundary at or after `t`.
    #[must_use]
    pub fn ceil(&self, t: OffsetDateTime) -> Option<OffsetDateTime> {
        let mut current = self.unit.floor(t);
        if current < t {
            current = self.unit.offset(current, 1)?;
        }
        while !self.accepts(current) {
            current = self.unit.offset(current, 1)?;
        }
        Some(current)
    }

    /// Kept boundaries within `[start, stop]` (inclusive).
    pub fn range(
        &self,
        start: OffsetDateTime,
        stop: OffsetDateTime,
    ) -> Result<Vec<OffsetDateTime>, TimeScaleError> {
        let mut out = Vec::new();
        let mut current = self.unit.floor(start);
        if current < start {
            match self.unit.offset(current, 1) {
                Some(next) => current = next,
                None => return Ok(out),
            }
        }
        let mut visited = 0usize;
        while current <= stop {
            visited += 1;
            if visited > MAX_TICK_CANDIDATES {
                return Err(TimeScaleError::TooManyTicks {
                    limit: MAX_TICK_CANDIDATES,
                });
            }
            if self.accepts(current) {
                out.push(current);
            }
            match self.unit.offset(current, 1) {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(out)
    }
}

/// Standard tick intervals, finest first, with their nominal lengths.
const TICK_INTERVALS: [(CalendarUnit, u32); 18] = [
    (CalendarUnit::Second, 1),
    (CalendarUnit::Second, 5),
    (CalendarUnit::Second, 15),
    (CalendarUnit::Second, 30),
    (CalendarUnit::Minute, 1),
    (CalendarUnit::Minute, 5),
    (CalendarUnit::Minute, 15),
    (CalendarUnit::Minute, 30),
    (CalendarUnit::Hour, 1),
    (CalendarUnit::Hour, 3),
    (CalendarUnit::Hour, 6),
    (CalendarUnit::Hour, 12),
    (CalendarUnit::Day, 1),
    (CalendarUnit::Day, 2),
    (CalendarUnit::Week, 1),
    (CalendarUnit::Month, 1),
    (CalendarUnit::Month, 3),
    (CalendarUnit::Year, 1),
];

fn nominal(entry: (CalendarUnit, u32)) -> f64 {
    (entry.0.nominal_nanos() * Nanos::from(entry.1)) as f64
}

/// How ticks are generated for a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPlan {
    /// Spans under a second per tick: plain decimal nanosecond ticks.
    Decimal,
    /// Calendar-aligned ticks.
    Calendar(CalendarInterval),
}

/// Pick the interval whose length best matches `|stop - start| / count`.
///
/// Between two neighbouring standard intervals the one with the smaller
/// ratio to the target wins; beyond a year, the year step is a decimal
/// multiple.
#[must_use]
pub fn tick_plan(start: Nanos, stop: Nanos, count: usize) -> TickPlan {
    let (lo, hi) = if stop < start { (stop, start) } else { (start, stop) };
    let target = (hi - lo) as f64 / count.max(1) as f64;
    let index = TICK_INTERVALS.partition_point(|&entry| nominal(entry) <= target);

    if index == TICK_INTERVALS.len() {
        let year = NANOS_PER_YEAR as f64;
        let step = tick_step(lo as f64 / year, hi as f64 / year, count.max(1));
        return TickPlan::Calendar(CalendarInterval::new(
            CalendarUnit::Year,
            step.max(1.0).round() as u32,
        ));
    }
    if index == 0 {
        return TickPlan::Decimal;
    }
    let below = TICK_INTERVALS[index - 1];
    let above = TICK_INTERVALS[index];
    let (unit, step) = if target / nominal(below) < nominal(above) / target {
        below
    } else {
        above
    };
    TickPlan::Calendar(CalendarInterval::new(unit, step))
}

/// Calendar datetime of `ns` at `offset`.
pub fn to_datetime(ns: Nanos, offset: UtcOffset) -> Result<OffsetDateTime, TimeScaleError> {
    OffsetDateTime::from_unix_timestamp_nanos(ns)
        .map(|t| t.to_offset(offset))
        .map_err(|_| TimeScaleError::Calendar { value: ns })
}

#[must_use]
pub fn to_nanos(t: OffsetDateTime) -> Nanos {
    t.unix_timestamp_nanos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn floors() {
        let t = datetime!(2017-12-21 23:15:30.023456789 UTC);
        assert_eq!(
            CalendarUnit::Millisecond.floor(t),
            datetime!(2017-12-21 23:15:30.023 UTC)
        );
        assert_eq!(CalendarUnit::Second.floor(t), datetime!(2017-12-21 23:15:30 UTC));
        assert_eq!(CalendarUnit::Minute.floor(t), datetime!(2017-12-21 23:15 UTC));
        assert_eq!(CalendarUnit::Hour.floor(t), datetime!(2017-12-21 23:00 UTC));
        assert_eq!(CalendarUnit::Day.floor(t), datetime!(2017-12-21 0:00 UTC));
        // 2017-12-21 was a Thursday.
        assert_eq!(CalendarUnit::Week.floor(t), datetime!(2017-12-17 0:00 UTC));
        assert_eq!(CalendarUnit::Month.floor(t), datetime!(2017-12-01 0:00 UTC));
        assert_eq!(CalendarUnit::Year.floor(t), datetime!(2017-01-01 0:00 UTC));
    }

    #[test]
    fn floors_respect_offset() {
        let t = datetime!(2020-03-01 01:30 UTC).to_offset(offset!(-5));
        assert_eq!(CalendarUnit::Day.floor(t), datetime!(2020-02-29 0:00 -5));
        assert_eq!(CalendarUnit::Month.floor(t), datetime!(2020-02-01 0:00 -5));
    }

    #[test]
    fn month_offsets_clamp_day() {
        let jan31 = datetime!(2021-01-31 12:00 UTC);
        assert_eq!(
            CalendarUnit::Month.offset(jan31, 1),
            Some(datetime!(2021-02-28 12:00 UTC))
        );
        assert_eq!(
            CalendarUnit::Month.offset(jan31, -2),
            Some(datetime!(2020-11-30 12:00 UTC))
        );
        assert_eq!(
            CalendarUnit::Year.offset(datetime!(2020-02-29 0:00 UTC), 1),
            Some(datetime!(2021-02-28 0:00 UTC))
        );
    }

    #[test]
    fn week_field_counts_from_epoch_sunday() {
        assert_eq!(CalendarUnit::Week.field(datetime!(1970-01-04 0:00 UTC)), 0);
        assert_eq!(CalendarUnit::Week.field(datetime!(1970-01-03 0:00 UTC)), -1);
        assert_eq!(CalendarUnit::Week.field(datetime!(1970-01-11 5:00 UTC)), 1);
    }

    #[test]
    fn every_nth_hour() {
        let every_six = CalendarInterval::new(CalendarUnit::Hour, 6);
        let ticks = every_six
            .range(
                datetime!(2000-01-01 01:00 UTC),
                datetime!(2000-01-02 00:00 UTC),
            )
            .unwrap();
        let hours: Vec<u8> = ticks.iter().map(|t| t.hour()).collect();
        assert_eq!(hours, vec![6, 12, 18, 0]);
    }

    #[test]
    fn interval_floor_and_ceil() {
        let quarter = CalendarInterval::new(CalendarUnit::Month, 3);
        let t = datetime!(2019-05-17 8:00 UTC);
        assert_eq!(quarter.floor(t), Some(datetime!(2019-04-01 0:00 UTC)));
        assert_eq!(quarter.ceil(t), Some(datetime!(2019-07-01 0:00 UTC)));
        let aligned = datetime!(2019-07-01 0:00 UTC);
        assert_eq!(quarter.ceil(aligned), Some(aligned));
    }

    #[test]
    fn plan_picks_closest_interval() {
        let start = 0;
        // Ten ticks over ten minutes: one minute each.
        assert_eq!(
            tick_plan(start, 10 * NANOS_PER_MINUTE, 10),
            TickPlan::Calendar(CalendarInterval::new(CalendarUnit::Minute, 1))
        );
        // 40 s per tick sits closer to 30 s than to a minute.
        assert_eq!(
            tick_plan(start, 400 * NANOS_PER_SECOND, 10),
            TickPlan::Calendar(CalendarInterval::new(CalendarUnit::Second, 30))
        );
        // Sub-second targets fall back to decimal ticks.
        assert_eq!(tick_plan(start, NANOS_PER_SECOND, 10), TickPlan::Decimal);
    }

    #[test]
    fn plan_beyond_a_year_uses_decimal_year_steps() {
        let plan = tick_plan(0, 200 * NANOS_PER_YEAR, 10);
        assert_eq!(
            plan,
            TickPlan::Calendar(CalendarInterval::new(CalendarUnit::Year, 20))
        );
    }

    #[test]
    fn too_many_candidates_is_an_error() {
        let every_ms = CalendarInterval::new(CalendarUnit::Millisecond, 1);
        let err = every_ms
            .range(datetime!(2000-01-01 0:00 UTC), datetime!(2000-01-02 0:00 UTC))
            .unwrap_err();
        assert_eq!(
            err,
            TimeScaleError::TooManyTicks {
                limit: MAX_TICK_CANDIDATES
            }
        );
    }

    #[test]
    fn nanos_round_trip_through_datetime() {
        let ns = 1_513_898_130_023_456_789;
        let t = to_datetime(ns, UtcOffset::UTC).unwrap();
        assert_eq!(to_nanos(t), ns);
        let shifted = to_datetime(ns, offset!(+9)).unwrap();
        assert_eq!(to_nanos(shifted), ns);
    }
}
