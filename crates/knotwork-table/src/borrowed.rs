//! Lookup tables over caller-provided storage.

use std::fmt;

use knotwork_core::TableError;
use knotwork_ledger::SharedAllocator;

use crate::grid::Grid;
use crate::owned::LookupTable;
use crate::sample::Sample;
use crate::table::{FillMode, SampleTable};

/// A lookup table that adopts a mutable slice for its lifetime.
///
/// The table never allocates or frees; the borrow checker keeps the slice
/// alive and unaliased while the table exists. Only the first `n` elements
/// of the slice are used. The slice is not cleared, so a manual table starts
/// from whatever values the caller left in it.
///
/// # Examples
///
/// ```
/// use knotwork_table::{BorrowedTable, SampleTable};
///
/// let mut storage = [0.0f64; 8];
/// let mut t = BorrowedTable::manual("ramp", &mut storage, 0.0, 1.0, 3).unwrap();
/// t.set(2, 10.0).unwrap();
/// assert_eq!(t.read(0.75).unwrap(), 5.0);
/// drop(t);
/// assert_eq!(storage[2], 10.0);
/// ```
pub struct BorrowedTable<'a, T: Sample> {
    name: String,
    grid: Grid<T>,
    samples: &'a mut [T],
    fill: FillMode,
}

impl<'a, T: Sample> BorrowedTable<'a, T> {
    /// Sample `f` into the first `n` elements of `buffer`.
    ///
    /// Returns `Err(TableError::BufferTooShort)` if `buffer` holds fewer
    /// than `n` elements.
    pub fn sampled<F>(
        name: impl Into<String>,
        buffer: &'a mut [T],
        min: T,
        max: T,
        n: usize,
        f: F,
    ) -> Result<Self, TableError>
    where
        F: FnMut(T) -> T,
    {
        let table = Self::adopt(name.into(), buffer, min, max, n, FillMode::Sampled)?;
        table.grid.sample_into(&mut *table.samples, f);
        Ok(table)
    }

    /// Adopt the first `n` elements of `buffer` as a manually filled table.
    pub fn manual(
        name: impl Into<String>,
        buffer: &'a mut [T],
        min: T,
        max: T,
        n: usize,
    ) -> Result<Self, TableError> {
        Self::adopt(name.into(), buffer, min, max, n, FillMode::Manual)
    }

    /// Copy into a table that owns its samples, drawn from `allocator`.
    ///
    /// The copy keeps this table's name, grid and fill mode.
    pub fn to_owned_in(&self, allocator: &SharedAllocator) -> Result<LookupTable<T>, TableError> {
        let mut samples = allocator.allocate_zeroed::<T>(self.samples.len(), &self.name)?;
        samples.copy_from_slice(&self.samples[..]);
        Ok(LookupTable::from_parts(
            allocator,
            self.name.clone(),
            self.grid,
            samples,
            self.fill,
        ))
    }

    /// Give the adopted slice back.
    pub fn into_inner(self) -> &'a mut [T] {
        self.samples
    }

    fn adopt(
        name: String,
        buffer: &'a mut [T],
        min: T,
        max: T,
        n: usize,
        fill: FillMode,
    ) -> Result<Self, TableError> {
        let grid = Grid::new(min, max, n)?;
        if buffer.len() < n {
            return Err(TableError::BufferTooShort {
                needed: n,
                len: buffer.len(),
            });
        }
        Ok(Self {
            name,
            grid,
            samples: &mut buffer[..n],
            fill,
        })
    }
}

impl<T: Sample> SampleTable<T> for BorrowedTable<'_, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn grid(&self) -> Option<&Grid<T>> {
        Some(&self.grid)
    }

    fn samples(&self) -> &[T] {
        &self.samples[..]
    }

    fn fill_mode(&self) -> Option<FillMode> {
        Some(self.fill)
    }

    fn owns_buffer(&self) -> bool {
        false
    }

    fn parts_mut(&mut self) -> Option<(&mut Grid<T>, &mut [T])> {
        Some((&mut self.grid, &mut *self.samples))
    }
}

impl<T: Sample> fmt::Debug for BorrowedTable<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BorrowedTable")
            .field("name", &self.name)
            .field("grid", &self.grid)
            .field("fill", &self.fill)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knotwork_ledger::{AlwaysReject, BoundedAllocator};

    #[test]
    fn sampled_writes_into_caller_buffer() {
        let mut buf = vec![-1.0f64; 5];
        {
            let t =
                BorrowedTable::sampled("sq", &mut buf[..], 0.0, 4.0, 4, |x| x * x).unwrap();
            assert_eq!(t.len(), 4);
            assert_eq!(t.grid().unwrap().dx(), 4.0 / 3.0);
        }
        assert_eq!(buf[0], 0.0);
        assert_eq!(buf[4], -1.0);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut buf = [0.0f32; 3];
        assert_eq!(
            BorrowedTable::manual("short", &mut buf, 0.0, 1.0, 4).unwrap_err(),
            TableError::BufferTooShort { needed: 4, len: 3 }
        );
    }

    #[test]
    fn grid_errors_take_precedence() {
        let mut buf = [0.0f64; 1];
        assert_eq!(
            BorrowedTable::manual("g", &mut buf, 0.0, 1.0, 1).unwrap_err(),
            TableError::TooFewPoints { n: 1 }
        );
    }

    #[test]
    fn manual_keeps_existing_values() {
        let mut buf = [1.0f64, 2.0, 3.0];
        let t = BorrowedTable::manual("keep", &mut buf, 0.0, 2.0, 3).unwrap();
        assert_eq!(t.table(1).unwrap(), 2.0);
        assert_eq!(t.read(1.5).unwrap(), 2.5);
    }

    #[test]
    fn mutation_reaches_caller_buffer() {
        let mut buf = [1.0f64, 2.0];
        let mut t = BorrowedTable::manual("m", &mut buf, 0.0, 1.0, 2).unwrap();
        t.multiply(3.0);
        t.convert_units(2.0, 0.5).unwrap();
        assert_eq!(t.grid().unwrap().max(), 2.0);
        let inner = t.into_inner();
        assert_eq!(inner, &[1.5, 3.0]);
    }

    #[test]
    fn failed_unit_conversion_leaves_table_alone() {
        let mut buf = [1.0f64, 2.0, 3.0];
        let mut t = BorrowedTable::manual("u", &mut buf, 0.0, 7.0, 3).unwrap();
        assert!(matches!(
            t.convert_units(1e308, 2.0),
            Err(TableError::InvalidScale { .. })
        ));
        assert_eq!(t.grid().unwrap().max(), 7.0);
        assert_eq!(t.samples(), &[1.0, 2.0, 3.0]);
        assert_eq!(t.read(3.5).unwrap(), 2.0);
    }

    #[test]
    fn sampled_table_refuses_set() {
        let mut buf = [0.0f64; 2];
        let mut t = BorrowedTable::sampled("s", &mut buf, 0.0, 1.0, 2, |x| x).unwrap();
        assert!(matches!(t.set(0, 1.0), Err(TableError::NotManualFill { .. })));
    }

    #[test]
    fn to_owned_in_copies_into_ledger() {
        let alloc = BoundedAllocator::new(Box::new(AlwaysReject));
        let mut buf = [0.0f64; 4];
        let borrowed = BorrowedTable::sampled("lin", &mut buf, 0.0, 3.0, 4, |x| x).unwrap();
        let mut owned = borrowed.to_owned_in(&alloc).unwrap();
        assert_eq!(alloc.ledger().current_bytes(), 32);
        assert_eq!(owned.samples(), borrowed.samples());
        assert_eq!(owned.fill_mode(), Some(FillMode::Sampled));
        owned.multiply(2.0);
        assert_eq!(borrowed.table(3).unwrap(), 3.0);
        assert_eq!(owned.table(3).unwrap(), 6.0);
    }

    #[test]
    fn report_marks_borrowed() {
        let mut buf = [0.0f32; 2];
        let t = BorrowedTable::manual("b", &mut buf, 0.0, 1.0, 2).unwrap();
        assert!(t.report().to_string().contains("(borrowed)"));
        assert_eq!(t.size_bytes(), 8);
    }
}
