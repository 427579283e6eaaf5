//! Numeric element types a lookup table can store.

use std::fmt;
use std::ops::{Add, Div, Mul, MulAssign, Sub};

use knotwork_ledger::Zeroable;

/// A floating-point value usable as both domain coordinate and sample.
///
/// Implemented for `f32` and `f64`.
pub trait Sample:
    Zeroable
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + MulAssign
{
    /// Additive identity.
    const ZERO: Self;
    /// Multiplicative identity.
    const ONE: Self;

    /// Convert a knot index.
    fn from_usize(i: usize) -> Self;
    /// Widen to `f64` for diagnostics and error values.
    fn to_f64(self) -> f64;
    /// Largest integer value not greater than `self`.
    fn floor(self) -> Self;
    /// Neither infinite nor NaN.
    fn is_finite(self) -> bool;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(
            impl Sample for $t {
                const ZERO: Self = 0.0;
                const ONE: Self = 1.0;

                #[inline]
                fn from_usize(i: usize) -> Self {
                    i as $t
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn floor(self) -> Self {
                    <$t>::floor(self)
                }

                #[inline]
                fn is_finite(self) -> bool {
                    <$t>::is_finite(self)
                }
            }
        )*
    };
}

impl_sample!(f32, f64);
