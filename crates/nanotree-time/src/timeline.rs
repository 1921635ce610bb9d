#![forbid(unsafe_code)]

//! Mapping tree paths onto absolute time.
//!
//! The root node covers `64 × 2^root_resolution` nanoseconds starting at
//! `root_start`. Each level down divides a node into 64 cells, so a node at
//! level `L` spans `2^(root_resolution + 6 - 6L)` ns and each of its cells
//! `2^(root_resolution - 6L)` ns. With the defaults (start `-2^60`,
//! resolution 56) the root spans about 146 years around the epoch and a
//! level-9 cell is 4 ns wide.

use std::fmt;

use nanotree_core::{BRANCHING, ConfigError, MAX_PATH_LEN, Path, PathError};

use crate::Nanos;
use crate::format::format_duration;
use crate::scale::{MAX_TIMESTAMP, MIN_TIMESTAMP, PrecisionTimeScale, TimeScaleError};

/// `log2(64)`: bits of time consumed per tree level.
const LEVEL_BITS: u32 = 6;

/// Errors from timeline lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// Cells at this level would be narrower than one nanosecond.
    ResolutionUnderflow { level: usize },
    /// Timestamp outside the root node.
    OutsideTree { timestamp: Nanos },
    Path(PathError),
    Scale(TimeScaleError),
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolutionUnderflow { level } => {
                write!(f, "level {level} cells are finer than one nanosecond")
            }
            Self::OutsideTree { timestamp } => {
                write!(f, "timestamp {timestamp} ns lies outside the tree")
            }
            Self::Path(err) => write!(f, "{err}"),
            Self::Scale(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TimelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Path(err) => Some(err),
            Self::Scale(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PathError> for TimelineError {
    fn from(err: PathError) -> Self {
        Self::Path(err)
    }
}

impl From<TimeScaleError> for TimelineError {
    fn from(err: TimeScaleError) -> Self {
        Self::Scale(err)
    }
}

/// Placement of the root node in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Start of the root node.
    pub root_start: Nanos,
    /// `log2` of a root cell's width in nanoseconds.
    pub root_resolution: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            root_start: -(1 << 60),
            root_resolution: 56,
        }
    }
}

impl TimelineConfig {
    /// Largest resolution whose root still fits in `i64` nanoseconds.
    pub const MAX_ROOT_RESOLUTION: u32 = 56;

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.root_resolution > Self::MAX_ROOT_RESOLUTION {
            errors.push(ConfigError::new(
                "root_resolution",
                self.root_resolution.to_string(),
                format!("must be at most {}", Self::MAX_ROOT_RESOLUTION),
            ));
        } else {
            let span: Nanos = 1 << (self.root_resolution + LEVEL_BITS);
            let end = self.root_start + span;
            if self.root_start < MIN_TIMESTAMP || end > MAX_TIMESTAMP {
                errors.push(ConfigError::new(
                    "root_start",
                    self.root_start.to_string(),
                    "root node must lie within i64 nanoseconds",
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Tree path to time-domain mapping.
///
/// # Example
/// ```
/// use nanotree_core::Path;
/// use nanotree_time::TreeTimeline;
///
/// let timeline = TreeTimeline::default();
/// let path = Path::new(&[16, 0, 5]).unwrap();
/// let [start, end] = timeline.node_domain(&path).unwrap();
/// assert_eq!(end - start, 1 << 44);
/// assert_eq!(timeline.locate(start, 3).unwrap(), path);
/// assert_eq!(timeline.span_label(3).unwrap(), "4.89 hours");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeTimeline {
    config: TimelineConfig,
}

impl TreeTimeline {
    /// Build from a validated config.
    pub fn new(config: TimelineConfig) -> Result<Self, Vec<ConfigError>> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> TimelineConfig {
        self.config
    }

    /// `log2` of the cell width at `level`, if at least one nanosecond.
    fn cell_bits(&self, level: usize) -> Result<u32, TimelineError> {
        u32::try_from(level)
            .ok()
            .and_then(|level| level.checked_mul(LEVEL_BITS))
            .and_then(|drop| self.config.root_resolution.checked_sub(drop))
            .ok_or(TimelineError::ResolutionUnderflow { level })
    }

    /// Width of one cell of a level-`level` node.
    pub fn cell_width(&self, level: usize) -> Result<Nanos, TimelineError> {
        Ok(1 << self.cell_bits(level)?)
    }

    /// Full span of a level-`level` node.
    pub fn node_span(&self, level: usize) -> Result<Nanos, TimelineError> {
        let bits = self.config.root_resolution + LEVEL_BITS;
        u32::try_from(level)
            .ok()
            .and_then(|level| level.checked_mul(LEVEL_BITS))
            .and_then(|drop| bits.checked_sub(drop))
            .map(|bits| 1 << bits)
            .ok_or(TimelineError::ResolutionUnderflow { level })
    }

    /// Start of the node at `path`.
    pub fn node_start(&self, path: &Path) -> Result<Nanos, TimelineError> {
        path.segments()
            .iter()
            .enumerate()
            .try_fold(self.config.root_start, |start, (level, &segment)| {
                Ok(start + Nanos::from(segment) * self.cell_width(level)?)
            })
    }

    /// `[start, end)` of the node at `path`.
    pub fn node_domain(&self, path: &Path) -> Result<[Nanos; 2], TimelineError> {
        let start = self.node_start(path)?;
        Ok([start, start + self.node_span(path.len())?])
    }

    /// `[start, end)` of cell `index` inside the node at `path`.
    pub fn cell_domain(&self, path: &Path, index: usize) -> Result<[Nanos; 2], TimelineError> {
        let start = self.node_start(path)?;
        let width = self.cell_width(path.len())?;
        if index >= BRANCHING {
            return Err(PathError::SegmentOutOfRange {
                position: path.len(),
                value: u32::try_from(index).unwrap_or(u32::MAX),
            }
            .into());
        }
        let cell_start = start + width * index as Nanos;
        Ok([cell_start, cell_start + width])
    }

    /// Path of length `depth` whose node contains `timestamp`.
    pub fn locate(&self, timestamp: Nanos, depth: usize) -> Result<Path, TimelineError> {
        if depth > MAX_PATH_LEN {
            return Err(PathError::TooDeep { len: depth }.into());
        }
        let [root_start, root_end] = self.node_domain(&Path::root())?;
        if !(root_start..root_end).contains(&timestamp) {
            return Err(TimelineError::OutsideTree { timestamp });
        }

        let mut path = Path::root();
        let mut start = root_start;
        for level in 0..depth {
            let width = self.cell_width(level)?;
            let index = (timestamp - start) / width;
            start += index * width;
            path = path.child(usize::try_from(index).unwrap_or(BRANCHING))?;
        }
        Ok(path)
    }

    /// Human label for how long a level-`level` node lasts.
    pub fn span_label(&self, level: usize) -> Result<String, TimelineError> {
        Ok(format_duration(self.node_span(level)?))
    }

    /// Scale mapping the node at `path` onto `range`.
    pub fn node_scale(
        &self,
        path: &Path,
        range: [f64; 2],
    ) -> Result<PrecisionTimeScale, TimelineError> {
        Ok(PrecisionTimeScale::from_domain(
            self.node_domain(path)?,
            range,
        )?)
    }
}
