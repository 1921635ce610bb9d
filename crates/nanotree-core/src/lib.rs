#![forbid(unsafe_code)]

//! Core: tree paths, aggregate statistics, and shared configuration helpers.

pub mod config;
pub mod path;
pub mod stat;

pub use config::{ConfigError, ConfigParse};
pub use path::{BRANCHING, MAX_PATH_LEN, Path, PathError};
pub use stat::{Stat, count_for_remaining_depth};
