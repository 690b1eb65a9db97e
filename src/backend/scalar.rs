use ndarray::{LinalgScalar, ScalarOperand};
use std::fmt::{Debug, Display};
use std::ops::{AddAssign, DivAssign, MulAssign, Neg, SubAssign};

/// Floating-point element type of every weight vector, bias and feature
/// matrix handled by the estimators.
///
/// This is the crate's notion of `dtype`: pick `f64` (the default on the
/// estimators) or `f32` by choosing the type parameter. Hyperparameters live
/// in the configuration as `f64` and are converted with [`ScalarOps::from_f64`]
/// where they meet the model state.
///
/// On top of the arithmetic required by `ndarray` ([`LinalgScalar`] for
/// `dot`/`scaled_add`, [`ScalarOperand`] for `array *= scalar`) the trait adds
/// the handful of math functions the step-size schedule and the metrics need.
///
/// # Example
/// ```
/// use asgd::backend::ScalarOps;
///
/// let x = 8.0f64;
/// assert_eq!(ScalarOps::powf(x, 1.0 / 3.0).round(), 2.0);
/// assert_eq!(<f32 as ScalarOps>::from_f64(0.5), 0.5f32);
/// ```
pub trait ScalarOps:
    LinalgScalar
    + ScalarOperand
    + PartialOrd
    + Debug
    + Display
    + Send
    + Sync
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + Neg<Output = Self>
{
    /// Converts an `f64` host value (hyperparameters, literals) to this type.
    fn from_f64(v: f64) -> Self;

    /// Converts this value to `f64`, for logging and error reporting.
    fn to_f64(self) -> f64;

    /// Converts a count (observations, examples) to this type.
    fn from_usize(n: usize) -> Self;

    /// Raises `self` to a floating-point power.
    fn powf(self, exponent: Self) -> Self;

    /// Square root. Negative inputs yield NaN, following IEEE 754.
    fn sqrt(self) -> Self;

    /// Absolute value.
    fn abs(self) -> Self;

    /// Larger of two values; NaN loses against a number.
    fn max(self, other: Self) -> Self;

    /// `true` unless the value is NaN or infinite.
    fn is_finite(self) -> bool;
}

impl ScalarOps for f64 {
    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_usize(n: usize) -> Self {
        n as f64
    }

    fn powf(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn max(self, other: Self) -> Self {
        f64::max(self, other)
    }

    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

/// Single precision, matching the `float` buffers of BLAS-style callers.
impl ScalarOps for f32 {
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_usize(n: usize) -> Self {
        n as f32
    }

    fn powf(self, exponent: Self) -> Self {
        f32::powf(self, exponent)
    }

    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    fn abs(self) -> Self {
        f32::abs(self)
    }

    fn max(self, other: Self) -> Self {
        f32::max(self, other)
    }

    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }
}
