#![forbid(unsafe_code)]

//! Lazily materialized aggregate tree.
//!
//! The conceptual tree has `64^depth` nodes; only the nodes a caller actually
//! visits are ever generated. Visiting any child of a node materializes all
//! 64 siblings at once: their raw stats are sampled from the [`NoiseField`],
//! fitted into the node's own stat, and stored together with the node's
//! mid-resolution aggregates. Resolving a deep path first resolves (and
//! caches) every ancestor.
//!
//! # Example
//! ```
//! use nanotree_core::Path;
//! use nanotree_stats::{AggregationCache, TreeConfig};
//!
//! let mut cache = AggregationCache::new(TreeConfig::new(7, 9));
//!
//! let parent = cache.resolve(&Path::new(&[0]).unwrap()).unwrap();
//! let child = cache.resolve(&Path::new(&[0, 5]).unwrap()).unwrap();
//! assert!(parent.contains(&child));
//! assert_eq!(child.count * 64, parent.count);
//!
//! // Siblings were materialized together: the root and node 0 only.
//! cache.resolve(&Path::new(&[0, 6]).unwrap());
//! assert_eq!(cache.stats().misses, 2);
//! ```
//!
//! # Invariants
//!
//! 1. **Deterministic**: the same seed and depth give bit-identical stats,
//!    regardless of visiting order.
//! 2. **Single materialization**: a node's children are generated and fitted
//!    at most once per cache.
//! 3. **Containment**: every materialized child set lies within its parent's
//!    stat and attains both of its bounds.
//!
//! # Memory
//!
//! Nothing is evicted. Memory grows with the number of distinct nodes
//! visited (64 stats plus aggregates each), which stays small for
//! interactive navigation.
//!
//! # Thread Safety
//! `AggregationCache` is not thread-safe; resolution takes `&mut self`.

use nanotree_core::{BRANCHING, Path, Stat};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::aggregate::{FULL_RESOLUTION, MID_RESOLUTIONS, mid_resolutions};
use crate::config::TreeConfig;
use crate::fit::fit_children;
use crate::noise::NoiseField;

/// Statistics about cache behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered from an already materialized node.
    pub hits: u64,
    /// Nodes materialized (each one a 64-child generate-and-fit pass).
    pub misses: u64,
    /// Materialized nodes currently held.
    pub nodes: usize,
}

impl CacheStats {
    /// Calculate hit rate (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    children: Box<[Stat; BRANCHING]>,
    mid: [Vec<Stat>; MID_RESOLUTIONS],
}

/// Caller-owned lazy aggregate tree.
#[derive(Debug)]
pub struct AggregationCache {
    noise: NoiseField,
    nodes: FxHashMap<Path, Node>,
    root: Option<Stat>,
    hits: u64,
    misses: u64,
}

impl AggregationCache {
    /// Create an empty tree for `config`. Out-of-range depths are clamped.
    #[must_use]
    pub fn new(config: TreeConfig) -> Self {
        Self::with_noise(NoiseField::new(config.seed, config.max_depth))
    }

    /// Create an empty tree over a prepared noise field.
    #[must_use]
    pub fn with_noise(noise: NoiseField) -> Self {
        Self {
            noise,
            nodes: FxHashMap::default(),
            root: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Effective configuration (after clamping).
    #[must_use]
    pub fn config(&self) -> TreeConfig {
        TreeConfig::new(self.noise.seed(), self.noise.max_depth())
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.noise.max_depth()
    }

    /// Stat of the node at `path`, materializing ancestors as needed.
    ///
    /// The root path yields the root stat: the envelope of the root's raw
    /// children. Paths deeper than [`max_depth`](Self::max_depth) yield
    /// `None`.
    pub fn resolve(&mut self, path: &Path) -> Option<Stat> {
        if path.len() > self.max_depth() {
            return None;
        }
        let (Some(parent), Some(index)) = (path.parent(), path.last()) else {
            return self.root_stat();
        };

        if let Some(node) = self.nodes.get(&parent) {
            self.hits += 1;
            trace!(path = %path, "stat cache hit");
            return Some(node.children[index]);
        }

        self.materialize(&parent)?;
        self.nodes.get(&parent).map(|node| node.children[index])
    }

    /// Stats of every node from the root down to `path`, root first.
    pub fn resolve_lineage(&mut self, path: &Path) -> Option<Vec<Stat>> {
        (0..=path.len())
            .map(|len| self.resolve(&path.prefix(len)))
            .collect()
    }

    /// Children of the node at `path` aggregated into `2^resolution` buckets.
    ///
    /// `resolution` 0 is one bucket spanning every child; 6 is the children
    /// themselves. Returns `None` for `resolution > 6`, for leaf nodes, and for
    /// paths beyond the tree.
    pub fn resolve_mid_res(&mut self, path: &Path, resolution: u32) -> Option<Vec<Stat>> {
        if resolution > FULL_RESOLUTION {
            return None;
        }
        self.materialize(path)?;
        let node = self.nodes.get(path)?;
        if resolution == FULL_RESOLUTION {
            Some(node.children.to_vec())
        } else {
            Some(node.mid[resolution as usize].clone())
        }
    }

    /// All 64 child stats of the node at `path`, materializing it if needed.
    pub fn children(&mut self, path: &Path) -> Option<&[Stat; BRANCHING]> {
        self.materialize(path)?;
        self.nodes.get(path).map(|node| &*node.children)
    }

    /// Stat of `path` if it is already known, without generating anything.
    #[must_use]
    pub fn peek(&self, path: &Path) -> Option<Stat> {
        match (path.parent(), path.last()) {
            (Some(parent), Some(index)) => {
                self.nodes.get(&parent).map(|node| node.children[index])
            }
            _ => self.root,
        }
    }

    /// Whether the children of `path` have been generated.
    #[must_use]
    pub fn is_materialized(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    /// Number of materialized nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            nodes: self.nodes.len(),
        }
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// Drop every materialized node. Later lookups regenerate identical stats.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    fn root_stat(&mut self) -> Option<Stat> {
        if let Some(root) = self.root {
            return Some(root);
        }
        let root_path = Path::root();
        self.materialize(&root_path)?;
        let node = self.nodes.get(&root_path)?;
        let stat = Stat::envelope(&node.children[..])?;
        self.root = Some(stat);
        Some(stat)
    }

    /// Generate, fit, and store the children of `path` unless already present.
    fn materialize(&mut self, path: &Path) -> Option<()> {
        if self.nodes.contains_key(path) {
            self.hits += 1;
            return Some(());
        }
        if path.len() >= self.max_depth() {
            return None;
        }

        // Resolving the node's own stat materializes its ancestors first.
        let envelope = if path.is_root() {
            None
        } else {
            Some(self.resolve(path)?)
        };

        let mut raw = [Stat::default(); BRANCHING];
        for (slot, child) in raw.iter_mut().zip(path.children()?) {
            *slot = self.noise.sample(&child)?;
        }
        let children = match envelope {
            Some(parent) => fit_children(&raw, &parent).stats,
            None => raw,
        };

        self.misses += 1;
        debug!(path = %path, level = path.len(), "materialized node");
        let mid = mid_resolutions(&children);
        self.nodes.insert(
            path.clone(),
            Node {
                children: Box::new(children),
                mid,
            },
        );
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[u8]) -> Path {
        Path::new(segments).unwrap()
    }

    fn cache(max_depth: usize) -> AggregationCache {
        AggregationCache::new(TreeConfig::new(42, max_depth))
    }

    #[test]
    fn new_cache_is_empty() {
        let cache = cache(9);
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.config(), TreeConfig::new(42, 9));
    }

    #[test]
    fn config_is_clamped() {
        assert_eq!(cache(0).max_depth(), 1);
        assert_eq!(cache(50).max_depth(), 10);
    }

    #[test]
    fn root_stat_is_envelope_of_root_children() {
        let mut cache = cache(9);
        let root = cache.resolve(&Path::root()).unwrap();
        let children = *cache.children(&Path::root()).unwrap();
        let lo = children.iter().map(|s| s.min).fold(f64::INFINITY, f64::min);
        let hi = children.iter().map(|s| s.max).fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(root.min, lo);
        assert_eq!(root.max, hi);
        assert_eq!(root.count, 64u64.pow(9));
        assert!(root.is_ordered());
    }

    #[test]
    fn root_children_are_raw_noise() {
        let mut cache = cache(9);
        let noise = NoiseField::new(42, 9);
        for i in [0u8, 17, 63] {
            let p = path(&[i]);
            assert_eq!(cache.resolve(&p), noise.sample(&p));
        }
    }

    #[test]
    fn deep_resolve_materializes_ancestors() {
        let mut cache = cache(9);
        cache.resolve(&path(&[1, 2, 3])).unwrap();
        assert!(cache.is_materialized(&Path::root()));
        assert!(cache.is_materialized(&path(&[1])));
        assert!(cache.is_materialized(&path(&[1, 2])));
        assert!(!cache.is_materialized(&path(&[1, 2, 3])));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().misses, 3);
    }

    #[test]
    fn siblings_share_one_materialization() {
        let mut cache = cache(9);
        cache.resolve(&path(&[4, 0])).unwrap();
        let misses = cache.stats().misses;
        for i in 1..64u8 {
            cache.resolve(&path(&[4, i])).unwrap();
        }
        assert_eq!(cache.stats().misses, misses);
        assert_eq!(cache.stats().hits, 63);
    }

    #[test]
    fn repeated_resolve_is_stable() {
        let mut cache = cache(9);
        let p = path(&[9, 8, 7, 6]);
        let first = cache.resolve(&p).unwrap();
        let second = cache.resolve(&p).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.peek(&p), Some(first));
    }

    #[test]
    fn visiting_order_does_not_change_results() {
        let mut a = cache(9);
        let mut b = cache(9);
        let target = path(&[3, 3, 3]);
        a.resolve(&path(&[3, 60, 1])).unwrap();
        a.resolve(&path(&[0])).unwrap();
        let from_a = a.resolve(&target).unwrap();
        let from_b = b.resolve(&target).unwrap();
        assert_eq!(from_a, from_b);
    }

    #[test]
    fn too_deep_paths_are_absent() {
        let mut cache = cache(3);
        assert!(cache.resolve(&path(&[1, 2, 3])).is_some());
        assert!(cache.resolve(&path(&[1, 2, 3, 4])).is_none());
        assert!(cache.children(&path(&[1, 2, 3])).is_none());
    }

    #[test]
    fn peek_does_not_materialize() {
        let cache = cache(9);
        assert!(cache.peek(&path(&[1])).is_none());
        assert!(cache.peek(&Path::root()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn lineage_runs_root_to_leaf() {
        let mut cache = cache(4);
        let lineage = cache.resolve_lineage(&path(&[1, 2, 3, 4])).unwrap();
        assert_eq!(lineage.len(), 5);
        for pair in lineage.windows(2) {
            assert!(pair[0].contains(&pair[1]));
            assert_eq!(pair[0].count, pair[1].count * 64);
        }
        assert_eq!(lineage[4].count, 1);
    }

    #[test]
    fn mid_res_bounds() {
        let mut cache = cache(9);
        let p = path(&[2]);
        let own = cache.resolve(&p).unwrap();
        let one = cache.resolve_mid_res(&p, 0).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].min, own.min);
        assert_eq!(one[0].max, own.max);
        let full = cache.resolve_mid_res(&p, 6).unwrap();
        assert_eq!(&full[..], &cache.children(&p).unwrap()[..]);
        assert!(cache.resolve_mid_res(&p, 7).is_none());
    }

    #[test]
    fn mid_res_on_leaf_is_absent() {
        let mut cache = cache(2);
        assert!(cache.resolve_mid_res(&path(&[1, 1]), 3).is_none());
        assert_eq!(cache.resolve_mid_res(&path(&[1]), 3).unwrap().len(), 8);
    }

    #[test]
    fn clear_regenerates_identically() {
        let mut cache = cache(9);
        let p = path(&[5, 6, 7]);
        let before = cache.resolve(&p).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.resolve(&p).unwrap(), before);
    }

    #[test]
    fn reset_stats_zeroes_counters() {
        let mut cache = cache(9);
        cache.resolve(&path(&[1, 1])).unwrap();
        cache.resolve(&path(&[1, 2])).unwrap();
        cache.reset_stats();
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (0, 0));
        assert_eq!(stats.nodes, 2);
    }

    #[test]
    fn hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            nodes: 1,
        };
        assert!((stats.hit_rate() - 0.75).abs() < 1e-12);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
