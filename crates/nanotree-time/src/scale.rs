#![forbid(unsafe_code)]

//! Nanosecond time scale that stays exact at any epoch magnitude.
//!
//! An `f64` holds integers exactly only up to 2^53, while nanosecond
//! timestamps near the present are around 1.7 × 10^18. A plain linear scale
//! therefore loses everything below a few hundred nanoseconds. This scale
//! switches representation by domain span:
//!
//! | Mode | Domain span | Mapping | Ticks | `nice` |
//! |------|-------------|---------|-------|--------|
//! | Low | > threshold | `f64` nanoseconds | calendar (decimal below 1 s) | calendar floor/ceil |
//! | High | <= threshold | `(t - t0)` in `i128`, then `f64` | decimal nanoseconds | decimal rounding |
//!
//! The mode is recomputed on every domain change and never changes the
//! contract: callers only see [`Scale`] plus the formatting helpers.
//!
//! # Environment Variables
//! - `NANOTREE_HIGH_PRECISION_SPAN` (ns, `1..=2^53`, default `10_000_000`)
//! - `NANOTREE_UTC_OFFSET_MINUTES` (`-1439..=1439`, default `0`)
//!
//! # Example
//! ```
//! use nanotree_time::{Mode, PrecisionTimeScale, Scale};
//!
//! let t0 = 1_513_898_130_023_456_000;
//! let mut scale = PrecisionTimeScale::new();
//! scale.set_domain([t0, t0 + 1_000]).unwrap();
//! scale.set_range([0.0, 1000.0]);
//!
//! assert!(matches!(scale.mode(), Mode::High { .. }));
//! assert_eq!(scale.evaluate(t0 + 1), 1.0);
//! assert_eq!(scale.invert(999.0), t0 + 999);
//! assert_eq!(scale.tick_format(t0 + 100).unwrap(), "100ns");
//! ```

use std::env;
use std::fmt;

use nanotree_core::config::{apply_env, parse_integer};
use nanotree_core::{ConfigError, ConfigParse};
use time::UtcOffset;
use tracing::{debug, warn};

use crate::Nanos;
use crate::calendar::{CalendarInterval, TickPlan, tick_plan, to_datetime, to_nanos};
use crate::format;
use crate::linear::{Interpolation, LinearScale, Scale};
use crate::ticks::{checked, integer_nice, integer_ticks};

const ENV_HIGH_PRECISION_SPAN: &str = "NANOTREE_HIGH_PRECISION_SPAN";
const ENV_UTC_OFFSET_MINUTES: &str = "NANOTREE_UTC_OFFSET_MINUTES";

/// Earliest accepted domain endpoint.
pub const MIN_TIMESTAMP: Nanos = i64::MIN as Nanos;
/// Latest accepted domain endpoint.
pub const MAX_TIMESTAMP: Nanos = i64::MAX as Nanos;

/// Largest span still mapped in high-precision mode by default (10 ms).
pub const DEFAULT_HIGH_PRECISION_SPAN: Nanos = 10_000_000;
/// Largest configurable threshold: spans beyond this lose integer precision
/// as `f64`.
pub const MAX_HIGH_PRECISION_SPAN: Nanos = 1 << 53;
/// Largest accepted UTC offset magnitude, in minutes.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 23 * 60 + 59;

/// 2000-01-01T00:00:00Z.
const DEFAULT_START: Nanos = 946_684_800_000_000_000;
const DEFAULT_STOP: Nanos = DEFAULT_START + 86_400_000_000_000;

/// Errors from time scale operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeScaleError {
    /// Domain endpoint outside `MIN_TIMESTAMP..=MAX_TIMESTAMP`.
    OutOfRange { value: Nanos },
    /// Instant not representable as a calendar datetime.
    Calendar { value: Nanos },
    /// Tick enumeration visited more candidates than allowed.
    TooManyTicks { limit: usize },
    /// UTC offset outside the supported range.
    UtcOffset { minutes: i32 },
    /// High-precision threshold outside `1..=MAX_HIGH_PRECISION_SPAN`.
    HighPrecisionSpan { span: Nanos },
    /// Label formatting failed.
    Format(String),
}

impl fmt::Display for TimeScaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { value } => write!(
                f,
                "timestamp {value} ns outside [{MIN_TIMESTAMP}, {MAX_TIMESTAMP}]"
            ),
            Self::Calendar { value } => {
                write!(f, "timestamp {value} ns has no calendar representation")
            }
            Self::TooManyTicks { limit } => {
                write!(f, "tick interval too fine: more than {limit} candidates")
            }
            Self::UtcOffset { minutes } => write!(
                f,
                "utc offset {minutes} min outside ±{MAX_UTC_OFFSET_MINUTES}"
            ),
            Self::HighPrecisionSpan { span } => write!(
                f,
                "high precision span {span} ns outside 1..={MAX_HIGH_PRECISION_SPAN}"
            ),
            Self::Format(message) => write!(f, "format error: {message}"),
        }
    }
}

impl std::error::Error for TimeScaleError {}

impl From<time::error::Format> for TimeScaleError {
    fn from(err: time::error::Format) -> Self {
        Self::Format(err.to_string())
    }
}

fn check_timestamp(value: Nanos) -> Result<Nanos, TimeScaleError> {
    if (MIN_TIMESTAMP..=MAX_TIMESTAMP).contains(&value) {
        Ok(value)
    } else {
        Err(TimeScaleError::OutOfRange { value })
    }
}

/// Representation currently backing a [`PrecisionTimeScale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Floating-point nanoseconds with calendar ticks.
    Low,
    /// Values mapped relative to `offset` (the first domain endpoint).
    High { offset: Nanos },
}

impl Mode {
    #[must_use]
    pub fn is_high(self) -> bool {
        matches!(self, Self::High { .. })
    }
}

/// Time scale settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleConfig {
    /// Domains spanning at most this many nanoseconds use high precision.
    pub high_precision_span: Nanos,
    /// Fixed offset the calendar is evaluated in.
    pub utc_offset_minutes: i32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            high_precision_span: DEFAULT_HIGH_PRECISION_SPAN,
            utc_offset_minutes: 0,
        }
    }
}

impl ScaleConfig {
    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse<Self> {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if !(1..=MAX_HIGH_PRECISION_SPAN).contains(&self.high_precision_span) {
            errors.push(ConfigError::new(
                "high_precision_span",
                self.high_precision_span.to_string(),
                format!("must be within 1..={MAX_HIGH_PRECISION_SPAN}"),
            ));
        }
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            errors.push(ConfigError::new(
                "utc_offset_minutes",
                self.utc_offset_minutes.to_string(),
                format!("must be within ±{MAX_UTC_OFFSET_MINUTES}"),
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Calendar offset as a `time` value.
    pub fn utc_offset(&self) -> Result<UtcOffset, TimeScaleError> {
        let minutes = self.utc_offset_minutes;
        if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(TimeScaleError::UtcOffset { minutes });
        }
        UtcOffset::from_whole_seconds(minutes * 60)
            .map_err(|_| TimeScaleError::UtcOffset { minutes })
    }
}

pub(crate) fn from_env_with<F>(mut get: F) -> ConfigParse<ScaleConfig>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = ScaleConfig::default();
    let mut errors = Vec::new();

    apply_env(
        &mut get,
        ENV_HIGH_PRECISION_SPAN,
        "high_precision_span",
        "expected integer nanoseconds",
        parse_integer,
        &mut config.high_precision_span,
        &mut errors,
    );
    apply_env(
        &mut get,
        ENV_UTC_OFFSET_MINUTES,
        "utc_offset_minutes",
        "expected integer minutes",
        parse_integer,
        &mut config.utc_offset_minutes,
        &mut errors,
    );

    if let Err(violations) = config.validate() {
        let defaults = ScaleConfig::default();
        for violation in &violations {
            match violation.field {
                "high_precision_span" => {
                    config.high_precision_span = defaults.high_precision_span;
                }
                "utc_offset_minutes" => config.utc_offset_minutes = defaults.utc_offset_minutes,
                _ => {}
            }
        }
        errors.extend(violations);
    }

    ConfigParse { config, errors }
}

/// Time scale over `i128` nanosecond timestamps.
///
/// Cloning yields an independent copy with the same domain, range, clamping,
/// and interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionTimeScale {
    domain: [Nanos; 2],
    linear: LinearScale,
    mode: Mode,
    config: ScaleConfig,
    offset: UtcOffset,
}

impl Default for PrecisionTimeScale {
    fn default() -> Self {
        Self::new()
    }
}

impl PrecisionTimeScale {
    /// Scale over 2000-01-01 to 2000-01-02 UTC onto `[0, 1]`.
    #[must_use]
    pub fn new() -> Self {
        let mut scale = Self {
            domain: [DEFAULT_START, DEFAULT_STOP],
            linear: LinearScale::default(),
            mode: Mode::Low,
            config: ScaleConfig::default(),
            offset: UtcOffset::UTC,
        };
        scale.apply_domain([DEFAULT_START, DEFAULT_STOP]);
        scale
    }

    /// Default domain with custom settings.
    ///
    /// Thresholds beyond 2^53 ns are rejected: `f64` could no longer hold
    /// every offset of a high-precision domain exactly.
    pub fn with_config(config: ScaleConfig) -> Result<Self, TimeScaleError> {
        let offset = config.utc_offset()?;
        let span = config.high_precision_span;
        if !(1..=MAX_HIGH_PRECISION_SPAN).contains(&span) {
            return Err(TimeScaleError::HighPrecisionSpan { span });
        }
        let mut scale = Self::new();
        scale.config = config;
        scale.offset = offset;
        scale.apply_domain(scale.domain);
        Ok(scale)
    }

    /// Scale over `domain` onto `range` with default settings.
    pub fn from_domain(domain: [Nanos; 2], range: [f64; 2]) -> Result<Self, TimeScaleError> {
        let mut scale = Self::new();
        scale.set_domain(domain)?;
        scale.set_range(range);
        Ok(scale)
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn config(&self) -> ScaleConfig {
        self.config
    }

    #[must_use]
    pub fn utc_offset(&self) -> UtcOffset {
        self.offset
    }

    /// Replace the domain, choosing the mode from its span.
    ///
    /// Endpoints outside `MIN_TIMESTAMP..=MAX_TIMESTAMP` are rejected and
    /// leave the scale unchanged.
    pub fn set_domain(&mut self, domain: [Nanos; 2]) -> Result<(), TimeScaleError> {
        check_timestamp(domain[0])?;
        check_timestamp(domain[1])?;
        self.apply_domain(domain);
        Ok(())
    }

    fn apply_domain(&mut self, domain: [Nanos; 2]) {
        let [t0, t1] = domain;
        let span = (t1 - t0).abs();
        let mode = if span > self.config.high_precision_span {
            Mode::Low
        } else {
            Mode::High { offset: t0 }
        };
        if mode.is_high() != self.mode.is_high() {
            debug!(span = %span, high = mode.is_high(), "time scale mode changed");
        }

        self.domain = domain;
        self.mode = mode;
        match mode {
            Mode::Low => self.linear.set_domain([t0 as f64, t1 as f64]),
            Mode::High { .. } => self.linear.set_domain([0.0, (t1 - t0) as f64]),
        }
    }

    /// Roughly `count` ticks across the domain, in domain order.
    pub fn try_ticks(&self, count: usize) -> Result<Vec<Nanos>, TimeScaleError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let [t0, t1] = self.domain;
        match (self.mode, tick_plan(t0, t1, count)) {
            (Mode::High { .. }, _) | (Mode::Low, TickPlan::Decimal) => {
                Ok(integer_ticks(t0, t1, count))
            }
            (Mode::Low, TickPlan::Calendar(interval)) => self.ticks_every(interval),
        }
    }

    /// Every boundary of `interval` within the domain, in domain order.
    pub fn ticks_every(&self, interval: CalendarInterval) -> Result<Vec<Nanos>, TimeScaleError> {
        let [t0, t1] = self.domain;
        let (lo, hi) = if t1 < t0 { (t1, t0) } else { (t0, t1) };
        let start = to_datetime(lo, self.offset)?;
        let stop = to_datetime(hi, self.offset)?;
        let mut ticks: Vec<Nanos> = interval
            .range(start, stop)?
            .into_iter()
            .map(to_nanos)
            .collect();
        if t1 < t0 {
            ticks.reverse();
        }
        Ok(ticks)
    }

    /// Widen the domain outward to round values for about `count` ticks.
    ///
    /// Calendar-scale domains snap to calendar boundaries; fine domains snap
    /// to decimal nanosecond multiples. The mode is recomputed afterwards.
    pub fn try_nice(&mut self, count: usize) -> Result<(), TimeScaleError> {
        if count == 0 {
            return Ok(());
        }
        let [t0, t1] = self.domain;
        let niced = match (self.mode, tick_plan(t0, t1, count)) {
            (Mode::High { .. }, _) | (Mode::Low, TickPlan::Decimal) => {
                integer_nice(self.domain, count)
            }
            (Mode::Low, TickPlan::Calendar(interval)) => {
                let reverse = t1 < t0;
                let (lo, hi) = if reverse { (t1, t0) } else { (t0, t1) };
                let floor = interval
                    .floor(to_datetime(lo, self.offset)?)
                    .ok_or(TimeScaleError::Calendar { value: lo })?;
                let ceil = interval
                    .ceil(to_datetime(hi, self.offset)?)
                    .ok_or(TimeScaleError::Calendar { value: hi })?;
                let (lo, hi) = (to_nanos(floor), to_nanos(ceil));
                if reverse { [hi, lo] } else { [lo, hi] }
            }
        };
        self.set_domain(niced)
    }

    /// Label for one tick value.
    pub fn tick_format(&self, value: Nanos) -> Result<String, TimeScaleError> {
        format::tick_format(value, self.offset)
    }

    /// Label for what every instant in the domain shares.
    pub fn context_format(&self) -> Result<Option<String>, TimeScaleError> {
        format::context_format(self.domain, self.offset)
    }
}

impl Scale for PrecisionTimeScale {
    type Value = Nanos;

    fn domain(&self) -> [Nanos; 2] {
        self.domain
    }

    fn range(&self) -> [f64; 2] {
        self.linear.range()
    }

    fn set_range(&mut self, range: [f64; 2]) {
        self.linear.set_range(range);
    }

    fn is_clamped(&self) -> bool {
        self.linear.is_clamped()
    }

    fn set_clamp(&mut self, clamp: bool) {
        self.linear.set_clamp(clamp);
    }

    fn interpolation(&self) -> Interpolation {
        self.linear.interpolation()
    }

    fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.linear.set_interpolation(interpolation);
    }

    fn evaluate(&self, value: Nanos) -> f64 {
        match self.mode {
            Mode::Low => self.linear.evaluate(value as f64),
            Mode::High { offset } => {
                let relative = checked(value.checked_sub(offset), "evaluate");
                self.linear.evaluate(relative as f64)
            }
        }
    }

    /// Pixels beyond the modeled range (including infinities) saturate at
    /// `MIN_TIMESTAMP`/`MAX_TIMESTAMP`.
    fn invert(&self, pixel: f64) -> Nanos {
        // `as` saturates at the i128 bounds.
        let value = self.linear.invert(pixel).round() as Nanos;
        let value = match self.mode {
            Mode::Low => value,
            Mode::High { offset } => offset.saturating_add(value),
        };
        value.clamp(MIN_TIMESTAMP, MAX_TIMESTAMP)
    }

    fn ticks(&self, count: usize) -> Vec<Nanos> {
        self.try_ticks(count).unwrap_or_else(|err| {
            warn!(%err, "tick generation failed");
            Vec::new()
        })
    }

    fn nice(&mut self, count: usize) {
        if let Err(err) = self.try_nice(count) {
            warn!(%err, "nice left the domain unchanged");
        }
    }
}
