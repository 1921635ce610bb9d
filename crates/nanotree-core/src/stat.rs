#![forbid(unsafe_code)]

//! Aggregate statistics for a tree node.

use crate::path::BRANCHING;

/// Summary of every sample under a node.
///
/// Invariant: `min <= mean <= max`. A node with `count == 1` is a single
/// sample and has no spread.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stat {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub count: u64,
}

impl Stat {
    #[must_use]
    pub const fn new(min: f64, mean: f64, max: f64, count: u64) -> Self {
        Self {
            min,
            mean,
            max,
            count,
        }
    }

    /// A single sample.
    #[must_use]
    pub const fn point(value: f64) -> Self {
        Self::new(value, value, value, 1)
    }

    /// `max - min`.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.max - self.min
    }

    /// Whether `min <= mean <= max` holds (false if any field is NaN).
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.min <= self.mean && self.mean <= self.max
    }

    #[must_use]
    pub fn is_point(&self) -> bool {
        self.min == self.mean && self.mean == self.max
    }

    /// Whether `other` lies within this stat's `[min, max]` envelope.
    #[must_use]
    pub fn contains(&self, other: &Stat) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    /// Envelope of a group of stats: min of mins, max of maxes, unweighted
    /// mean of means, summed counts. Returns `None` for an empty group.
    #[must_use]
    pub fn envelope(group: &[Stat]) -> Option<Stat> {
        let first = group.first()?;
        let mut out = Stat::new(first.min, 0.0, first.max, 0);
        let mut sum = 0.0;
        for stat in group {
            out.min = out.min.min(stat.min);
            out.max = out.max.max(stat.max);
            out.count = out.count.saturating_add(stat.count);
            sum += stat.mean;
        }
        out.mean = sum / group.len() as f64;
        Some(out)
    }
}

/// Sample count of a node with `remaining` levels below it: `64^remaining`.
///
/// Returns `None` if the count would not fit in a `u64`.
#[must_use]
pub fn count_for_remaining_depth(remaining: u32) -> Option<u64> {
    (BRANCHING as u64).checked_pow(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_has_no_spread() {
        let p = Stat::point(4.5);
        assert!(p.is_point());
        assert!(p.is_ordered());
        assert_eq!(p.spread(), 0.0);
        assert_eq!(p.count, 1);
    }

    #[test]
    fn ordered_rejects_nan_and_inversion() {
        assert!(!Stat::new(2.0, 1.0, 3.0, 1).is_ordered());
        assert!(!Stat::new(f64::NAN, 1.0, 3.0, 1).is_ordered());
        assert!(Stat::new(0.0, 1.0, 3.0, 64).is_ordered());
    }

    #[test]
    fn contains_is_inclusive() {
        let parent = Stat::new(0.0, 5.0, 10.0, 64);
        assert!(parent.contains(&Stat::new(0.0, 2.0, 10.0, 1)));
        assert!(!parent.contains(&Stat::new(-0.1, 2.0, 3.0, 1)));
        assert!(!parent.contains(&Stat::new(1.0, 2.0, 10.5, 1)));
    }

    #[test]
    fn envelope_of_group() {
        let group = [
            Stat::new(1.0, 2.0, 3.0, 64),
            Stat::new(-1.0, 0.0, 2.0, 64),
            Stat::new(0.0, 4.0, 9.0, 64),
        ];
        let env = Stat::envelope(&group).unwrap();
        assert_eq!(env.min, -1.0);
        assert_eq!(env.max, 9.0);
        assert_eq!(env.mean, 2.0);
        assert_eq!(env.count, 192);
    }

    #[test]
    fn envelope_of_empty_group() {
        assert!(Stat::envelope(&[]).is_none());
    }

    #[test]
    fn counts_are_powers_of_64() {
        assert_eq!(count_for_remaining_depth(0), Some(1));
        assert_eq!(count_for_remaining_depth(1), Some(64));
        assert_eq!(count_for_remaining_depth(9), Some(1 << 54));
        assert_eq!(count_for_remaining_depth(10), Some(1 << 60));
        assert_eq!(count_for_remaining_depth(11), None);
    }
}
