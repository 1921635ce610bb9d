#![forbid(unsafe_code)]

//! Fitting a node's raw children into the node's own envelope.
//!
//! # Containment invariant
//!
//! After fitting, every child's `[min, max]` lies within the parent's
//! `[min, max]`, and the lowest child min and the highest child max equal the
//! parent's bounds exactly. This is what keeps nested zoom levels coherent.
//!
//! # Algorithm
//!
//! 1. Recenter the children around the mean of their means.
//! 2. Find the lowest relative min and highest relative max (first index wins
//!    ties).
//! 3. Pick one uniform scale that maps one extreme onto the parent's bound
//!    without pushing the other past its bound.
//! 4. Re-anchor on the parent mean, clamp into the parent envelope, then snap
//!    the two extreme children onto the parent's bounds exactly.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | No spread below or above the pivot | Scale 1, no snap |
//! | Both candidate scales overshoot by rounding | Smaller overshoot wins |
//! | Leaf children (`count == 1`) | Snapped children become points on the bounds |
//!
//! At leaf level the two snapped points move the children's average away
//! from the parent mean; the other 62 children are not rebalanced.

use nanotree_core::{BRANCHING, Stat};
use tracing::warn;

/// Children pinned onto the parent's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snap {
    /// Child whose min now equals the parent min.
    pub min_index: usize,
    /// Child whose max now equals the parent max.
    pub max_index: usize,
}

/// Result of fitting 64 children into a parent envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildFit {
    pub stats: [Stat; BRANCHING],
    /// Uniform scale applied to the recentered children.
    pub scale: f64,
    /// `None` when the children had no spread to scale.
    pub snapped: Option<Snap>,
}

/// Reshape `raw` children so their collective envelope matches `parent`.
#[must_use]
pub fn fit_children(raw: &[Stat; BRANCHING], parent: &Stat) -> ChildFit {
    let pivot = raw.iter().map(|s| s.mean).sum::<f64>() / BRANCHING as f64;

    let mut rel_min = f64::INFINITY;
    let mut rel_max = f64::NEG_INFINITY;
    let mut min_index = 0;
    let mut max_index = 0;
    for (i, stat) in raw.iter().enumerate() {
        let lo = stat.min - pivot;
        let hi = stat.max - pivot;
        if lo < rel_min {
            rel_min = lo;
            min_index = i;
        }
        if hi > rel_max {
            rel_max = hi;
            max_index = i;
        }
    }

    let target_min = parent.min - parent.mean;
    let target_max = parent.max - parent.mean;

    let degenerate = !(rel_min < 0.0 && rel_max > 0.0);
    let scale = if degenerate {
        warn!(
            rel_min,
            rel_max, "children have no spread around their pivot; fitting unscaled"
        );
        1.0
    } else {
        choose_scale(rel_min, rel_max, target_min, target_max)
    };

    let mut stats = [Stat::default(); BRANCHING];
    for (out, stat) in stats.iter_mut().zip(raw) {
        let place = |value: f64| (parent.mean + (value - pivot) * scale).clamp(parent.min, parent.max);
        *out = Stat::new(place(stat.min), place(stat.mean), place(stat.max), stat.count);
    }

    if degenerate {
        return ChildFit {
            stats,
            scale,
            snapped: None,
        };
    }

    if raw[min_index].count == 1 {
        stats[min_index] = Stat::point(parent.min);
        stats[max_index] = Stat::point(parent.max);
    } else {
        stats[min_index].min = parent.min;
        stats[max_index].max = parent.max;
    }

    ChildFit {
        stats,
        scale,
        snapped: Some(Snap {
            min_index,
            max_index,
        }),
    }
}

/// Pick the scale that lands one extreme on its target without the other
/// escaping; with rounding on both, the smaller overshoot.
fn choose_scale(rel_min: f64, rel_max: f64, target_min: f64, target_max: f64) -> f64 {
    let by_min = target_min / rel_min;
    let by_max = target_max / rel_max;
    let overshoot = |k: f64| {
        (target_min - rel_min * k).max(0.0) + (rel_max * k - target_max).max(0.0)
    };
    let (over_min, over_max) = (overshoot(by_min), overshoot(by_max));
    if over_min == 0.0 {
        by_min
    } else if over_max == 0.0 || over_max < over_min {
        by_max
    } else {
        by_min
    }
}
