#![forbid(unsafe_code)]

//! nanotree public facade crate.
//!
//! Re-exports the aggregate tree and the time scales, and offers a prelude
//! for callers that want both. The two halves are independent: the cache
//! answers "what values live under this path", the timeline and scales
//! answer "when is this path and where does it land on screen".
//!
//! # Example
//! ```
//! use nanotree::prelude::*;
//!
//! let mut cache = AggregationCache::new(TreeConfig::default());
//! let timeline = TreeTimeline::default();
//!
//! let path: Path = "16/0/5".parse()?;
//! let stat = cache.resolve(&path).expect("within max depth");
//! let scale = timeline.node_scale(&path, [0.0, 640.0])?;
//!
//! assert!(stat.is_ordered());
//! assert_eq!(scale.evaluate(scale.domain()[0]), 0.0);
//! # Ok::<(), nanotree::Error>(())
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use nanotree_core::{
    BRANCHING, ConfigError, ConfigParse, MAX_PATH_LEN, Path, PathError, Stat,
    count_for_remaining_depth,
};

// --- Stats re-exports ------------------------------------------------------

pub use nanotree_stats::{AggregationCache, CacheStats, NoiseField, TreeConfig};

// --- Time re-exports -------------------------------------------------------

pub use nanotree_time::{
    CalendarInterval, CalendarUnit, Interpolation, LinearScale, Mode, Nanos, PrecisionTimeScale,
    Scale, ScaleConfig, TimeScaleError, TimelineConfig, TimelineError, TreeTimeline,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for nanotree callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed or out-of-range path.
    Path(PathError),
    /// Time scale rejected a domain or failed to label it.
    Scale(TimeScaleError),
    /// Path or timestamp has no place on the timeline.
    Timeline(TimelineError),
    /// Invalid settings; every violation is listed.
    Config(Vec<ConfigError>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(err) => write!(f, "{err}"),
            Self::Scale(err) => write!(f, "{err}"),
            Self::Timeline(err) => write!(f, "{err}"),
            Self::Config(errors) => {
                write!(f, "invalid config")?;
                for err in errors {
                    write!(f, "; {err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Path(err) => Some(err),
            Self::Scale(err) => Some(err),
            Self::Timeline(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

impl From<PathError> for Error {
    fn from(err: PathError) -> Self {
        Self::Path(err)
    }
}

impl From<TimeScaleError> for Error {
    fn from(err: TimeScaleError) -> Self {
        Self::Scale(err)
    }
}

impl From<TimelineError> for Error {
    fn from(err: TimelineError) -> Self {
        Self::Timeline(err)
    }
}

impl From<Vec<ConfigError>> for Error {
    fn from(errors: Vec<ConfigError>) -> Self {
        Self::Config(errors)
    }
}

/// Standard result type for nanotree APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AggregationCache, Error, Mode, Nanos, Path, PrecisionTimeScale, Result, Scale, Stat,
        TreeConfig, TreeTimeline,
    };

    pub use crate::{core, stats, time};
}

pub use nanotree_core as core;
pub use nanotree_stats as stats;
pub use nanotree_time as time;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_convert_and_display() {
        let err: Error = PathError::TooDeep { len: 11 }.into();
        assert!(matches!(err, Error::Path(_)));
        assert!(std::error::Error::source(&err).is_some());

        let err: Error = vec![
            ConfigError::new("seed", "x", "expected integer"),
            ConfigError::new("max_depth", "0", "must be at least 1"),
        ]
        .into();
        let text = err.to_string();
        assert!(text.starts_with("invalid config; "));
        assert!(text.contains("seed"));
        assert!(text.contains("max_depth"));
    }

    #[test]
    fn question_mark_lifts_every_error() -> Result<()> {
        let path: Path = "1/2".parse()?;
        let timeline = TreeTimeline::default();
        let [start, end] = timeline.node_domain(&path)?;
        let scale = PrecisionTimeScale::from_domain([start, end], [0.0, 1.0])?;
        assert_eq!(scale.domain(), [start, end]);
        Ok(())
    }
}
