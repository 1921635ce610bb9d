#![forbid(unsafe_code)]

//! Mid-resolution aggregates over a node's 64 children.
//!
//! Resolution `k` groups the children into `2^k` contiguous buckets of equal
//! width. `k = 0` is a single bucket spanning every child and `k = 6` is the
//! children themselves.

use nanotree_core::{BRANCHING, Stat};

/// Highest resolution: one bucket per child.
pub const FULL_RESOLUTION: u32 = 6;

/// Resolutions stored per node (1 through 32 buckets).
pub const MID_RESOLUTIONS: usize = FULL_RESOLUTION as usize;

/// Aggregate `children` into `2^resolution` buckets.
///
/// Each bucket takes the min of mins, the max of maxes, and the unweighted
/// mean of means. Returns `None` when `resolution > 6`.
#[must_use]
pub fn mid_resolution(children: &[Stat; BRANCHING], resolution: u32) -> Option<Vec<Stat>> {
    if resolution > FULL_RESOLUTION {
        return None;
    }
    let width = BRANCHING >> resolution;
    Some(
        children
            .chunks_exact(width)
            .filter_map(Stat::envelope)
            .collect(),
    )
}

/// All stored resolutions (`0..6`) for one node.
#[must_use]
pub fn mid_resolutions(children: &[Stat; BRANCHING]) -> [Vec<Stat>; MID_RESOLUTIONS] {
    std::array::from_fn(|k| mid_resolution(children, k as u32).unwrap_or_default())
}
