//! The numeric value type samples are recorded as.
//!
//! Canonically a signed 64-bit integer or an IEEE-754 double; the
//! aggregation core is generic over any type implementing [`SampleValue`].

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A numeric sample type: supports addition/subtraction, scaling by a
/// sample count and by a floating-point fraction, and round-trips through
/// `f64` (needed for averages, rate arithmetic, and percentile
/// interpolation, which are inherently floating point regardless of `V`).
pub trait SampleValue:
    Copy
    + Default
    + PartialOrd
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + AddAssign
    + SubAssign
{
    /// `self * n`, where `n` is a sample count.
    fn mul_u64(self, n: u64) -> Self;

    /// `self * factor`, used by range-adjust and percentile interpolation.
    fn scale(self, factor: f64) -> Self;

    fn to_f64(self) -> f64;

    fn from_f64(v: f64) -> Self;

    fn min_value() -> Self;

    fn max_value() -> Self;
}

impl SampleValue for i64 {
    fn mul_u64(self, n: u64) -> Self {
        self * n as i64
    }

    fn scale(self, factor: f64) -> Self {
        (self as f64 * factor).round() as i64
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(v: f64) -> Self {
        v.round() as i64
    }

    fn min_value() -> Self {
        i64::MIN
    }

    fn max_value() -> Self {
        i64::MAX
    }
}

impl SampleValue for f64 {
    fn mul_u64(self, n: u64) -> Self {
        self * n as f64
    }

    fn scale(self, factor: f64) -> Self {
        self * factor
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(v: f64) -> Self {
        v
    }

    fn min_value() -> Self {
        f64::MIN
    }

    fn max_value() -> Self {
        f64::MAX
    }
}
