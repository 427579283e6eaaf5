//! Uniform sampling grid: domain bounds, knot spacing and index arithmetic.

use knotwork_core::TableError;

use crate::sample::Sample;

/// `n` evenly spaced knots covering `[min, max]`.
///
/// Knot `i` sits at `min + i * dx` with `dx = (max - min) / (n - 1)`.
/// `inv_dx` is cached so queries multiply instead of divide.
///
/// # Examples
///
/// ```
/// use knotwork_table::Grid;
///
/// let grid = Grid::new(0.0f64, 1.0, 5).unwrap();
/// assert_eq!(grid.dx(), 0.25);
/// assert_eq!(grid.knot(2), 0.5);
/// assert_eq!(grid.index_of(0.6).unwrap(), 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid<T> {
    min: T,
    max: T,
    n: usize,
    dx: T,
    inv_dx: T,
}

impl<T: Sample> Grid<T> {
    /// Build a grid of `n` knots over `[min, max]`.
    ///
    /// Returns `Err(TableError::TooFewPoints)` if `n < 2` and
    /// `Err(TableError::InvalidDomain)` unless both bounds are finite with
    /// `min < max` and the spacing is representable.
    pub fn new(min: T, max: T, n: usize) -> Result<Self, TableError> {
        if n < 2 {
            return Err(TableError::TooFewPoints { n });
        }
        let invalid = TableError::InvalidDomain {
            min: min.to_f64(),
            max: max.to_f64(),
        };
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(invalid);
        }
        let dx = (max - min) / T::from_usize(n - 1);
        let inv_dx = T::ONE / dx;
        // A span that underflows or overflows leaves no usable spacing.
        if !(dx > T::ZERO) || !dx.is_finite() || !inv_dx.is_finite() {
            return Err(invalid);
        }
        Ok(Self {
            min,
            max,
            n,
            dx,
            inv_dx,
        })
    }

    /// Lower domain bound.
    pub fn min(&self) -> T {
        self.min
    }

    /// Upper domain bound.
    pub fn max(&self) -> T {
        self.max
    }

    /// Number of knots.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Always `false`: construction requires at least two knots.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Knot spacing.
    pub fn dx(&self) -> T {
        self.dx
    }

    /// Reciprocal of the knot spacing.
    pub fn inv_dx(&self) -> T {
        self.inv_dx
    }

    /// Domain coordinate of knot `i`. Not range-checked.
    pub fn knot(&self, i: usize) -> T {
        self.min + T::from_usize(i) * self.dx
    }

    /// `(x - min) * inv_dx`: position of `x` in units of knots.
    pub fn normalize(&self, x: T) -> T {
        (x - self.min) * self.inv_dx
    }

    /// Index of the left knot of the interval containing `x`.
    ///
    /// Accepts the closed domain `[min, max]`; `x == max` maps to the last
    /// knot.
    pub fn index_of(&self, x: T) -> Result<usize, TableError> {
        if !x.is_finite() || x < self.min || x > self.max {
            return Err(self.out_of_domain(x));
        }
        let i = self.normalize(x).floor().to_f64() as usize;
        Ok(i.min(self.n - 1))
    }

    /// Left knot and fractional offset for an interpolated read at `x`.
    ///
    /// `x` must lie in `[min, max)`. The left knot is at most `n - 2`, so
    /// `i + 1` is always a valid sample index; when rounding would place `x`
    /// on the last knot it is read as the end of the final interval.
    pub fn locate(&self, x: T) -> Result<(usize, T), TableError> {
        if !x.is_finite() || x < self.min || x >= self.max {
            return Err(self.out_of_domain(x));
        }
        let xnorm = self.normalize(x);
        let i = (xnorm.floor().to_f64() as usize).min(self.n - 2);
        Ok((i, xnorm - T::from_usize(i)))
    }

    /// Rescale the domain axis by `scale`.
    ///
    /// `min`, `max` and `dx` are multiplied by `scale` and `inv_dx` by
    /// `1 / scale`, so the cached reciprocal is carried along rather than
    /// recomputed. `scale` must be finite and positive, and the rescaled
    /// grid must keep finite bounds with `min < max` and a finite, positive
    /// spacing and reciprocal. Otherwise `Err(TableError::InvalidScale)` is
    /// returned and the grid is unchanged.
    pub fn scale(&mut self, scale: T) -> Result<(), TableError> {
        let invalid = TableError::InvalidScale {
            scale: scale.to_f64(),
        };
        if !scale.is_finite() || !(scale > T::ZERO) {
            return Err(invalid);
        }
        let min = self.min * scale;
        let max = self.max * scale;
        let dx = self.dx * scale;
        let inv_dx = self.inv_dx * (T::ONE / scale);
        let usable = min.is_finite()
            && max.is_finite()
            && min < max
            && dx > T::ZERO
            && dx.is_finite()
            && inv_dx > T::ZERO
            && inv_dx.is_finite();
        if !usable {
            return Err(invalid);
        }
        self.min = min;
        self.max = max;
        self.dx = dx;
        self.inv_dx = inv_dx;
        Ok(())
    }

    /// Overwrite `samples` with `f` evaluated at each knot, in order.
    ///
    /// `f` is called exactly `samples.len()` times.
    pub fn sample_into<F>(&self, samples: &mut [T], mut f: F)
    where
        F: FnMut(T) -> T,
    {
        for (i, slot) in samples.iter_mut().enumerate() {
            *slot = f(self.knot(i));
        }
    }

    fn out_of_domain(&self, x: T) -> TableError {
        TableError::OutOfDomain {
            x: x.to_f64(),
            min: self.min.to_f64(),
            max: self.max.to_f64(),
        }
    }
}
