//! The query and mutation API shared by owning and borrowing tables.

use std::fmt;

use knotwork_core::{HumanBytes, TableError};

use crate::grid::Grid;
use crate::sample::Sample;

/// How a table's samples were produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillMode {
    /// Evaluated from a sampling function at construction. Read-only per
    /// knot; only whole-table rescaling is allowed.
    Sampled,
    /// Populated by the caller through [`SampleTable::set`].
    Manual,
}

/// Read access, interpolation, and value-axis mutation over a sampled grid.
///
/// Implementors supply the five accessors; every query is provided. An
/// uninitialised table reports no grid and an empty sample slice.
pub trait SampleTable<T: Sample> {
    /// Diagnostic label.
    fn name(&self) -> &str;

    /// Sampling grid, or `None` before initialisation.
    fn grid(&self) -> Option<&Grid<T>>;

    /// Stored samples; empty before initialisation.
    fn samples(&self) -> &[T];

    /// How the samples were produced, or `None` before initialisation.
    fn fill_mode(&self) -> Option<FillMode>;

    /// Whether the sample buffer is released by this table.
    fn owns_buffer(&self) -> bool;

    /// Mutable grid and samples together, or `None` before initialisation.
    fn parts_mut(&mut self) -> Option<(&mut Grid<T>, &mut [T])>;

    /// Whether the table holds a grid and samples.
    fn is_initialized(&self) -> bool {
        self.grid().is_some()
    }

    /// Number of stored samples.
    fn len(&self) -> usize {
        self.samples().len()
    }

    /// Whether no samples are stored (only before initialisation).
    fn is_empty(&self) -> bool {
        self.samples().is_empty()
    }

    /// Sample bytes held by the table.
    fn size_bytes(&self) -> u64 {
        (self.len() * std::mem::size_of::<T>()) as u64
    }

    /// The stored sample at knot `i`, verbatim.
    fn table(&self, i: usize) -> Result<T, TableError> {
        let samples = self.samples();
        samples
            .get(i)
            .copied()
            .ok_or(TableError::IndexOutOfRange {
                index: i,
                len: samples.len(),
            })
    }

    /// Domain coordinate of knot `i`.
    fn knot(&self, i: usize) -> Result<T, TableError> {
        let grid = require_grid(self)?;
        if i >= grid.len() {
            return Err(TableError::IndexOutOfRange {
                index: i,
                len: grid.len(),
            });
        }
        Ok(grid.knot(i))
    }

    /// Index of the left knot of the interval containing `x` (closed domain).
    fn index_of(&self, x: T) -> Result<usize, TableError> {
        require_grid(self)?.index_of(x)
    }

    /// Linearly interpolated value at `x`.
    ///
    /// `x` must lie in `[min, max)`; anything else, including `x == max`,
    /// returns `Err(TableError::OutOfDomain)`. The table never clamps or
    /// extrapolates. Read the final knot with `table(len - 1)`.
    fn read(&self, x: T) -> Result<T, TableError> {
        let (i, frac) = require_grid(self)?.locate(x)?;
        let samples = self.samples();
        let left = samples[i];
        Ok(left + (samples[i + 1] - left) * frac)
    }

    /// Interpolated value at `x` without domain validation.
    ///
    /// The fast path for inner loops whose inputs are already known to lie
    /// in `[min, max)`. Debug builds assert that. In release builds a point
    /// outside the domain yields an unspecified value; memory is never read
    /// out of bounds.
    ///
    /// # Panics
    ///
    /// Panics if the table is not initialised.
    #[inline]
    fn interpolate(&self, x: T) -> T {
        let Some(grid) = self.grid() else {
            panic!("lookup table '{}' is not initialised", self.name());
        };
        debug_assert!(
            x >= grid.min() && x < grid.max(),
            "interpolate({x}) outside [{}, {})",
            grid.min(),
            grid.max(),
        );
        let xnorm = grid.normalize(x);
        // Rounding can put x just below max on the last knot.
        let i = (xnorm.floor().to_f64() as usize).min(grid.len() - 2);
        let samples = self.samples();
        let left = samples[i];
        left + (samples[i + 1] - left) * (xnorm - T::from_usize(i))
    }

    /// Write `value` at knot `i` of a manually filled table.
    ///
    /// Returns `Err(TableError::NotInitialized)` before initialisation,
    /// `Err(TableError::NotManualFill)` for tables built from a sampling
    /// function, and `Err(TableError::IndexOutOfRange)` for `i >= len`.
    fn set(&mut self, i: usize, value: T) -> Result<(), TableError> {
        match self.fill_mode() {
            None => return Err(not_initialized(self)),
            Some(FillMode::Sampled) => {
                return Err(TableError::NotManualFill {
                    name: self.name().to_owned(),
                })
            }
            Some(FillMode::Manual) => {}
        }
        let len = self.len();
        let slot = self
            .parts_mut()
            .and_then(|(_, samples)| samples.get_mut(i))
            .ok_or(TableError::IndexOutOfRange { index: i, len })?;
        *slot = value;
        Ok(())
    }

    /// Multiply every sample by `scalar`. No-op before initialisation.
    fn multiply(&mut self, scalar: T) {
        if let Some((_, samples)) = self.parts_mut() {
            for v in samples.iter_mut() {
                *v *= scalar;
            }
        }
    }

    /// Rescale the domain by `x_scale` and every sample by `y_scale`.
    ///
    /// `x_scale` must be finite and positive, and the rescaled domain must
    /// still satisfy the grid invariants (see [`Grid::scale`]); on error
    /// nothing changes.
    /// Returns `Err(TableError::NotInitialized)` before initialisation.
    fn convert_units(&mut self, x_scale: T, y_scale: T) -> Result<(), TableError> {
        if !self.is_initialized() {
            return Err(not_initialized(self));
        }
        if let Some((grid, samples)) = self.parts_mut() {
            grid.scale(x_scale)?;
            for v in samples.iter_mut() {
                *v *= y_scale;
            }
        }
        Ok(())
    }

    /// A displayable summary of the table.
    fn report(&self) -> TableReport<'_, T> {
        TableReport {
            name: self.name(),
            grid: self.grid(),
            size_bytes: self.size_bytes(),
            owned: self.owns_buffer(),
        }
    }
}

fn require_grid<T: Sample, S: SampleTable<T> + ?Sized>(table: &S) -> Result<&Grid<T>, TableError> {
    table.grid().ok_or_else(|| not_initialized(table))
}

fn not_initialized<T: Sample, S: SampleTable<T> + ?Sized>(table: &S) -> TableError {
    TableError::NotInitialized {
        name: table.name().to_owned(),
    }
}

/// Multi-line table summary produced by [`SampleTable::report`].
pub struct TableReport<'a, T> {
    name: &'a str,
    grid: Option<&'a Grid<T>>,
    size_bytes: u64,
    owned: bool,
}

impl<T: Sample> fmt::Display for TableReport<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lookup table information:")?;
        writeln!(f, "    Name:               {}", self.name)?;
        let Some(grid) = self.grid else {
            return writeln!(f, "    (not initialised)");
        };
        writeln!(f, "    Range:              [{}, {}]", grid.min(), grid.max())?;
        writeln!(f, "    Number of points:   {}", grid.len())?;
        writeln!(f, "    dx:                 {}", grid.dx())?;
        let ownership = if self.owned { "owned" } else { "borrowed" };
        writeln!(
            f,
            "    Size:               {} ({ownership})",
            HumanBytes(self.size_bytes)
        )
    }
}
