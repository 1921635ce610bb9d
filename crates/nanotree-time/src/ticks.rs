#![forbid(unsafe_code)]

//! Decimal tick arithmetic.
//!
//! Steps are `1`, `2`, or `5` times a power of ten, chosen so that roughly
//! `count` ticks cover the requested span. The float variants serve
//! [`LinearScale`](crate::LinearScale); the integer variants produce exact
//! nanosecond ticks no matter how large the epoch offset.

/// Above `sqrt(50)` the step rounds up to 10.
const E10: f64 = 7.071_067_811_865_475_5;
/// Above `sqrt(10)` the step rounds up to 5.
const E5: f64 = 3.162_277_660_168_379_5;
/// Above `sqrt(2)` the step rounds up to 2.
const E2: f64 = std::f64::consts::SQRT_2;

fn mantissa(error: f64) -> f64 {
    if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    }
}

/// Tick increment for `start..stop` with about `count` ticks.
///
/// Positive results are the step itself. Negative results encode a
/// fractional step as its negated inverse (`-10.0` means a step of `0.1`),
/// which keeps tick values exact when multiplied back out.
#[must_use]
pub fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let m = mantissa(error);
    if power >= 0.0 {
        m * 10f64.powf(power)
    } else {
        -(10f64.powf(-power)) / m
    }
}

/// Signed tick step for `start..stop` with about `count` ticks.
#[must_use]
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let step0 = (stop - start).abs() / count as f64;
    let step1 = 10f64.powf(step0.log10().floor());
    let step = step1 * mantissa(step0 / step1);
    if stop < start { -step } else { step }
}

/// Evenly spaced round values within `[start, stop]` (inclusive).
///
/// The order follows the arguments: a reversed span yields descending ticks.
#[must_use]
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    if count == 0 || !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    if lo == hi {
        return vec![lo];
    }

    let step = tick_increment(lo, hi, count);
    if step == 0.0 || !step.is_finite() {
        return Vec::new();
    }
    let mut out: Vec<f64> = if step > 0.0 {
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    } else {
        let inverse = -step;
        let first = (lo * inverse).ceil() as i64;
        let last = (hi * inverse).floor() as i64;
        (first..=last).map(|i| i as f64 / inverse).collect()
    };
    if reverse {
        out.reverse();
    }
    out
}

/// Widen `[start, stop]` outward to round values.
///
/// Two passes: the first rounding can grow the span enough to change the
/// step.
#[must_use]
pub fn nice(domain: [f64; 2], count: usize) -> [f64; 2] {
    let reverse = domain[1] < domain[0];
    let (mut lo, mut hi) = if reverse {
        (domain[1], domain[0])
    } else {
        (domain[0], domain[1])
    };
    if count == 0 || lo == hi || !lo.is_finite() || !hi.is_finite() {
        return domain;
    }
    for _ in 0..2 {
        let step = tick_increment(lo, hi, count);
        if step > 0.0 {
            lo = (lo / step).floor() * step;
            hi = (hi / step).ceil() * step;
        } else if step < 0.0 {
            let inverse = -step;
            lo = (lo * inverse).floor() / inverse;
            hi = (hi * inverse).ceil() / inverse;
        } else {
            break;
        }
    }
    if reverse { [hi, lo] } else { [lo, hi] }
}

// ---------------------------------------------------------------------------
// Integer nanoseconds
// ---------------------------------------------------------------------------

/// Panics on overflow. Timestamps are validated to `i64` range on entry, so
/// the intermediate `i128` values here cannot overflow.
pub(crate) fn checked(value: Option<i128>, op: &str) -> i128 {
    match value {
        Some(value) => value,
        None => panic!("nanosecond arithmetic overflowed in {op}"),
    }
}

pub(crate) fn floor_div(a: i128, b: i128) -> i128 {
    a.div_euclid(b)
}

pub(crate) fn ceil_div(a: i128, b: i128) -> i128 {
    -((-a).div_euclid(b))
}

/// Integer tick step (at least 1) for a span of `span` units.
#[must_use]
pub fn integer_step(span: i128, count: usize) -> i128 {
    if count == 0 || span <= 0 {
        return 1;
    }
    let step = tick_increment(0.0, span as f64, count);
    if step >= 1.0 && step.is_finite() {
        step.round() as i128
    } else {
        1
    }
}

/// Exact integer ticks within `[start, stop]` (inclusive).
///
/// Ticks are multiples of the step, so they stay aligned to absolute round
/// values rather than to `start`.
#[must_use]
pub fn integer_ticks(start: i128, stop: i128, count: usize) -> Vec<i128> {
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    if count == 0 {
        return Vec::new();
    }
    if lo == hi {
        return vec![lo];
    }
    let step = integer_step(hi - lo, count);
    let first = ceil_div(lo, step);
    let last = floor_div(hi, step);
    let mut out: Vec<i128> = (first..=last)
        .map(|k| checked(k.checked_mul(step), "integer_ticks"))
        .collect();
    if reverse {
        out.reverse();
    }
    out
}

/// Integer counterpart of [`nice`].
#[must_use]
pub fn integer_nice(domain: [i128; 2], count: usize) -> [i128; 2] {
    let reverse = domain[1] < domain[0];
    let (mut lo, mut hi) = if reverse {
        (domain[1], domain[0])
    } else {
        (domain[0], domain[1])
    };
    if count == 0 || lo == hi {
        return domain;
    }
    for _ in 0..2 {
        let step = integer_step(hi - lo, count);
        lo = checked(floor_div(lo, step).checked_mul(step), "integer_nice");
        hi = checked(ceil_div(hi, step).checked_mul(step), "integer_nice");
    }
    if reverse { [hi, lo] } else { [lo, hi] }
}
