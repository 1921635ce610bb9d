#![forbid(unsafe_code)]

//! Tree generation configuration (deterministic, env-overridable).
//!
//! # Environment Variables
//! - `NANOTREE_SEED` (u64, decimal or `0x` hex)
//! - `NANOTREE_MAX_DEPTH` (1..=10)

use std::env;

use nanotree_core::config::{apply_env, parse_integer};
use nanotree_core::{ConfigError, ConfigParse, MAX_PATH_LEN};

const ENV_SEED: &str = "NANOTREE_SEED";
const ENV_MAX_DEPTH: &str = "NANOTREE_MAX_DEPTH";

/// "hello" as big-endian bytes.
pub const DEFAULT_SEED: u64 = 0x68_65_6c_6c_6f;

/// Shape and seed of a generated tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Seed for every noise permutation table.
    pub seed: u64,
    /// Length of leaf paths. Leaves hold a single sample (`count == 1`).
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_depth: MAX_PATH_LEN,
        }
    }
}

impl TreeConfig {
    #[must_use]
    pub fn new(seed: u64, max_depth: usize) -> Self {
        Self { seed, max_depth }
    }

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
        if !(1..=MAX_PATH_LEN).contains(&self.max_depth) {
            errors.push(ConfigError::new(
                "max_depth",
                self.max_depth.to_string(),
                format!("must be within 1..={MAX_PATH_LEN}"),
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub(crate) fn from_env_with<F>(mut get: F) -> ConfigParse<TreeConfig>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = TreeConfig::default();
    let mut errors = Vec::new();

    apply_env(
        &mut get,
        ENV_SEED,
        "seed",
        "expected u64 (decimal or 0x hex)",
        parse_integer,
        &mut config.seed,
        &mut errors,
    );
    apply_env(
        &mut get,
        ENV_MAX_DEPTH,
        "max_depth",
        "expected integer",
        parse_integer,
        &mut config.max_depth,
        &mut errors,
    );

    if let Err(violations) = config.validate() {
        errors.extend(violations);
        config.max_depth = config.max_depth.clamp(1, MAX_PATH_LEN);
    }

    ConfigParse { config, errors }
}
