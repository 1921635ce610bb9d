#![forbid(unsafe_code)]

//! Procedural multiresolution aggregate tree.
//!
//! Every node of a 64-ary tree carries a [`Stat`](nanotree_core::Stat)
//! summarizing the synthetic samples beneath it. Raw stats come from
//! deterministic layered simplex noise ([`noise`]); each node's children are
//! then fitted into the node's envelope ([`fit`]) so zooming in never reveals
//! values outside what the coarser level showed. [`AggregationCache`]
//! materializes nodes lazily and keeps their mid-resolution aggregates
//! ([`aggregate`]) for renderers drawing fewer than 64 columns.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod fit;
pub mod noise;

pub use aggregate::{FULL_RESOLUTION, MID_RESOLUTIONS, mid_resolution, mid_resolutions};
pub use cache::{AggregationCache, CacheStats};
pub use config::{DEFAULT_SEED, TreeConfig};
pub use fit::{ChildFit, Snap, fit_children};
pub use noise::{LEVEL_KNOBS, LevelKnobs, NoiseField, SimplexField};
