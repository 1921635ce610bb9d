#![forbid(unsafe_code)]

//! Deterministic raw statistics for any tree coordinate.
//!
//! Every level of the tree owns two fractal simplex fields: a *mean* field
//! and a *shadow* field. A node's mean comes from the mean field; its spread
//! below and above the mean comes from sampling the shadow field at two fixed
//! secondary coordinates, which yields independent-looking but deterministic
//! deviations on each side.
//!
//! # Determinism
//!
//! Permutation tables are drawn once from a [`ChaCha8Rng`] seeded with the
//! tree seed. After construction [`NoiseField::sample`] is a pure function of
//! the path.

use nanotree_core::{BRANCHING, MAX_PATH_LEN, Path, Stat, count_for_remaining_depth};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Secondary coordinate of the mean sample.
const MEAN_OFFSET: f64 = 0.0;
/// Secondary coordinate of the below-mean spread sample.
const MIN_OFFSET: f64 = 50.0;
/// Secondary coordinate of the above-mean spread sample.
const MAX_OFFSET: f64 = 80.0;

/// Path segments folded into the noise coordinate. 64^8 = 2^48 stays exact
/// in an f64.
const COORDINATE_DIGITS: usize = 8;

// Skew factors for 2D simplex: (sqrt(3) - 1) / 2 and (3 - sqrt(3)) / 6.
const F2: f64 = 0.366_025_403_784_438_6;
const G2: f64 = 0.211_324_865_405_187_1;

const GRAD3: [[f64; 2]; 12] = [
    [1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [-1.0, -1.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [0.0, 1.0],
    [0.0, -1.0],
];

/// Shape of the two noise fields at one tree level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelKnobs {
    pub mean_frequency: f64,
    pub shadow_frequency: f64,
    pub octaves: u32,
    pub persistence: f64,
    /// Output range of the mean field is `[0, mean_height]`.
    pub mean_height: f64,
    /// Output range of each spread sample is `[0, shadow_height]`.
    pub shadow_height: f64,
}

impl LevelKnobs {
    const fn new(
        mean_frequency: f64,
        shadow_frequency: f64,
        octaves: u32,
        persistence: f64,
        mean_height: f64,
        shadow_height: f64,
    ) -> Self {
        Self {
            mean_frequency,
            shadow_frequency,
            octaves,
            persistence,
            mean_height,
            shadow_height,
        }
    }
}

/// Shallow levels vary slowly and widely; deep levels quickly and narrowly.
#[rustfmt::skip]
pub const LEVEL_KNOBS: [LevelKnobs; MAX_PATH_LEN] = [
    LevelKnobs::new(0.010, 0.020, 6, 0.55, 160.0, 48.0),
    LevelKnobs::new(0.014, 0.026, 6, 0.55, 150.0, 44.0),
    LevelKnobs::new(0.018, 0.032, 5, 0.50, 140.0, 40.0),
    LevelKnobs::new(0.023, 0.040, 5, 0.50, 128.0, 36.0),
    LevelKnobs::new(0.030, 0.050, 5, 0.50, 116.0, 32.0),
    LevelKnobs::new(0.038, 0.062, 4, 0.48, 104.0, 28.0),
    LevelKnobs::new(0.048, 0.078, 4, 0.45,  92.0, 24.0),
    LevelKnobs::new(0.060, 0.096, 4, 0.45,  80.0, 20.0),
    LevelKnobs::new(0.076, 0.120, 3, 0.42,  68.0, 16.0),
    LevelKnobs::new(0.095, 0.150, 3, 0.40,  56.0, 12.0),
];

/// Fractal 2D simplex noise scaled into `[0, height]`.
#[derive(Clone)]
pub struct SimplexField {
    perm: [u8; 512],
    perm_mod12: [u8; 512],
    frequency: f64,
    octaves: u32,
    persistence: f64,
    height: f64,
}

impl std::fmt::Debug for SimplexField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplexField")
            .field("frequency", &self.frequency)
            .field("octaves", &self.octaves)
            .field("persistence", &self.persistence)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl SimplexField {
    /// Build a field whose permutation table is drawn from `rng`.
    pub fn new(
        rng: &mut ChaCha8Rng,
        frequency: f64,
        octaves: u32,
        persistence: f64,
        height: f64,
    ) -> Self {
        let mut table: Vec<u8> = (0..=255u8).collect();
        table.shuffle(rng);
        let mut perm = [0u8; 512];
        let mut perm_mod12 = [0u8; 512];
        for i in 0..512 {
            perm[i] = table[i & 255];
            perm_mod12[i] = perm[i] % 12;
        }
        Self {
            perm,
            perm_mod12,
            frequency,
            octaves: octaves.max(1),
            persistence,
            height,
        }
    }

    /// Single-octave simplex noise, roughly in `[-1, 1]`.
    #[must_use]
    pub fn raw(&self, xin: f64, yin: f64) -> f64 {
        let s = (xin + yin) * F2;
        let i = (xin + s).floor();
        let j = (yin + s).floor();
        let t = (i + j) * G2;
        let x0 = xin - (i - t);
        let y0 = yin - (j - t);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };
        let x1 = x0 - i1 as f64 + G2;
        let y1 = y0 - j1 as f64 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i64).rem_euclid(256) as usize;
        let jj = (j as i64).rem_euclid(256) as usize;
        let gi0 = self.perm_mod12[ii + usize::from(self.perm[jj])];
        let gi1 = self.perm_mod12[ii + i1 + usize::from(self.perm[jj + j1])];
        let gi2 = self.perm_mod12[ii + 1 + usize::from(self.perm[jj + 1])];

        let n0 = corner(gi0, x0, y0);
        let n1 = corner(gi1, x1, y1);
        let n2 = corner(gi2, x2, y2);
        70.0 * (n0 + n1 + n2)
    }

    /// Octave sum normalized back to roughly `[-1, 1]`.
    #[must_use]
    pub fn fractal(&self, x: f64, y: f64) -> f64 {
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut total = 0.0;
        let mut max_amplitude = 0.0;
        for _ in 0..self.octaves {
            total += self.raw(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= self.persistence;
            frequency *= 2.0;
        }
        total / max_amplitude
    }

    /// Fractal noise mapped into `[0, height]`.
    #[must_use]
    pub fn scaled(&self, x: f64, y: f64) -> f64 {
        let unit = ((self.fractal(x, y) + 1.0) / 2.0).clamp(0.0, 1.0);
        unit * self.height
    }
}

#[inline]
fn corner(gradient: u8, x: f64, y: f64) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        return 0.0;
    }
    let g = GRAD3[usize::from(gradient)];
    let t2 = t * t;
    t2 * t2 * (g[0] * x + g[1] * y)
}

#[derive(Debug, Clone)]
struct LevelNoise {
    mean: SimplexField,
    shadow: SimplexField,
}

/// Raw (unfitted) statistics for every path in a tree of fixed depth.
#[derive(Debug, Clone)]
pub struct NoiseField {
    levels: Vec<LevelNoise>,
    seed: u64,
    max_depth: usize,
}

impl NoiseField {
    /// Build the per-level fields for `seed`. `max_depth` is clamped into
    /// `1..=MAX_PATH_LEN`; paths of exactly that length are leaves.
    #[must_use]
    pub fn new(seed: u64, max_depth: usize) -> Self {
        Self::with_knobs(seed, max_depth, &LEVEL_KNOBS)
    }

    /// Build with custom per-level knobs.
    #[must_use]
    pub fn with_knobs(seed: u64, max_depth: usize, knobs: &[LevelKnobs; MAX_PATH_LEN]) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let levels = knobs
            .iter()
            .map(|k| LevelNoise {
                mean: SimplexField::new(
                    &mut rng,
                    k.mean_frequency,
                    k.octaves,
                    k.persistence,
                    k.mean_height,
                ),
                shadow: SimplexField::new(
                    &mut rng,
                    k.shadow_frequency,
                    k.octaves,
                    k.persistence,
                    k.shadow_height,
                ),
            })
            .collect();
        Self {
            levels,
            seed,
            max_depth: max_depth.clamp(1, MAX_PATH_LEN),
        }
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Raw statistic for `path`.
    ///
    /// Returns `None` for the root sentinel and for paths deeper than
    /// [`max_depth`](Self::max_depth).
    #[must_use]
    pub fn sample(&self, path: &Path) -> Option<Stat> {
        let level = path.level()?;
        if path.len() > self.max_depth {
            return None;
        }
        let fields = &self.levels[level];
        let x = noise_coordinate(path);

        let mean = fields.mean.scaled(x, MEAN_OFFSET);
        let count = count_for_remaining_depth((self.max_depth - path.len()) as u32)?;
        if count == 1 {
            return Some(Stat::point(mean));
        }
        let min = mean - fields.shadow.scaled(x, MIN_OFFSET);
        let max = mean + fields.shadow.scaled(x, MAX_OFFSET);
        Some(Stat::new(min, mean, max, count))
    }
}

/// Fold the deepest (up to 8) path segments into one exact scalar, treating
/// them as base-64 digits with the oldest kept segment most significant.
#[must_use]
pub fn noise_coordinate(path: &Path) -> f64 {
    let segments = path.segments();
    let start = segments.len().saturating_sub(COORDINATE_DIGITS);
    segments[start..]
        .iter()
        .fold(0.0, |acc, &digit| acc * BRANCHING as f64 + f64::from(digit))
}
