#![forbid(unsafe_code)]

//! Continuous scales mapping a domain onto a pixel range.

use crate::ticks;

/// How normalized positions are mapped onto the output range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Plain linear interpolation.
    #[default]
    Linear,
    /// Linear interpolation rounded to the nearest whole pixel.
    Round,
}

impl Interpolation {
    /// Point at fraction `t` between `a` and `b`.
    #[must_use]
    pub fn apply(self, a: f64, b: f64, t: f64) -> f64 {
        let value = a + (b - a) * t;
        match self {
            Self::Linear => value,
            Self::Round => value.round(),
        }
    }
}

/// Shared contract of every scale: domain values in, pixels out.
pub trait Scale {
    /// Domain value type.
    type Value: Copy;

    fn domain(&self) -> [Self::Value; 2];

    fn range(&self) -> [f64; 2];

    fn set_range(&mut self, range: [f64; 2]);

    /// Whether [`evaluate`](Self::evaluate) and [`invert`](Self::invert) clamp
    /// to the domain and range.
    fn is_clamped(&self) -> bool;

    fn set_clamp(&mut self, clamp: bool);

    fn interpolation(&self) -> Interpolation;

    fn set_interpolation(&mut self, interpolation: Interpolation);

    /// Map a domain value to the range.
    fn evaluate(&self, value: Self::Value) -> f64;

    /// Map a range value back to the domain.
    fn invert(&self, pixel: f64) -> Self::Value;

    /// Roughly `count` representative domain values, in domain order.
    fn ticks(&self, count: usize) -> Vec<Self::Value>;

    /// Extend the domain outward to round values.
    fn nice(&mut self, count: usize);

    /// Output at fraction `t` of the range.
    fn interpolate(&self, t: f64) -> f64 {
        let [r0, r1] = self.range();
        self.interpolation().apply(r0, r1, t)
    }

    /// Set the range and round output to whole pixels.
    fn set_range_round(&mut self, range: [f64; 2]) {
        self.set_range(range);
        self.set_interpolation(Interpolation::Round);
    }
}

/// Linear mapping from an `f64` domain onto an `f64` range.
///
/// # Example
/// ```
/// use nanotree_time::{LinearScale, Scale};
///
/// let scale = LinearScale::new([0.0, 10.0], [0.0, 500.0]);
/// assert_eq!(scale.evaluate(2.0), 100.0);
/// assert_eq!(scale.invert(250.0), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
    clamp: bool,
    interpolation: Interpolation,
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::new([0.0, 1.0], [0.0, 1.0])
    }
}

impl LinearScale {
    #[must_use]
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self {
            domain,
            range,
            clamp: false,
            interpolation: Interpolation::Linear,
        }
    }

    pub fn set_domain(&mut self, domain: [f64; 2]) {
        self.domain = domain;
    }

    /// Position of `value` within the domain. A zero-width domain maps
    /// everything to the midpoint.
    fn normalize(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let width = d1 - d0;
        if width == 0.0 {
            return 0.5;
        }
        let t = (value - d0) / width;
        if self.clamp { t.clamp(0.0, 1.0) } else { t }
    }
}

impl Scale for LinearScale {
    type Value = f64;

    fn domain(&self) -> [f64; 2] {
        self.domain
    }

    fn range(&self) -> [f64; 2] {
        self.range
    }

    fn set_range(&mut self, range: [f64; 2]) {
        self.range = range;
    }

    fn is_clamped(&self) -> bool {
        self.clamp
    }

    fn set_clamp(&mut self, clamp: bool) {
        self.clamp = clamp;
    }

    fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    fn evaluate(&self, value: f64) -> f64 {
        self.interpolate(self.normalize(value))
    }

    fn invert(&self, pixel: f64) -> f64 {
        let [r0, r1] = self.range;
        let [d0, d1] = self.domain;
        let width = r1 - r0;
        if width == 0.0 {
            return d0 + (d1 - d0) * 0.5;
        }
        let mut t = (pixel - r0) / width;
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        d0 + (d1 - d0) * t
    }

    fn ticks(&self, count: usize) -> Vec<f64> {
        ticks::ticks(self.domain[0], self.domain[1], count)
    }

    fn nice(&mut self, count: usize) {
        self.domain = ticks::nice(self.domain, count);
    }
}
