#![forbid(unsafe_code)]

//! Time scales for nanosecond timestamps spanning centuries.
//!
//! - [`PrecisionTimeScale`] maps `i128` nanosecond timestamps to pixels and
//!   back without losing nanoseconds, switching between a calendar-aware
//!   floating-point mapping and an offset-relative exact one by domain span.
//! - [`LinearScale`] is the plain `f64` scale both modes build on; the
//!   [`Scale`] trait is the contract they share.
//! - [`TreeTimeline`] places the nodes of the 64-ary tree on the time axis.

pub mod calendar;
pub mod format;
pub mod linear;
pub mod scale;
pub mod ticks;
pub mod timeline;

/// Nanoseconds since the Unix epoch.
pub type Nanos = i128;

pub use calendar::{CalendarInterval, CalendarUnit, TickPlan};
pub use format::{context_format, format_duration, tick_format};
pub use linear::{Interpolation, LinearScale, Scale};
pub use scale::{
    DEFAULT_HIGH_PRECISION_SPAN, MAX_TIMESTAMP, MIN_TIMESTAMP, Mode, PrecisionTimeScale,
    ScaleConfig, TimeScaleError,
};
pub use timeline::{TimelineConfig, TimelineError, TreeTimeline};
