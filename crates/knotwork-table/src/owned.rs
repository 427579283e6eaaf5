//! Lookup tables that own their sample buffer.

use std::fmt;
use std::ops::Index;
use std::rc::Rc;

use knotwork_core::TableError;
use knotwork_ledger::{SharedAllocator, TrackedBuffer};

use crate::grid::Grid;
use crate::sample::Sample;
use crate::table::{FillMode, SampleTable};

/// Grid, samples and fill mode of an initialised table.
struct Filled<T: Sample> {
    grid: Grid<T>,
    samples: TrackedBuffer<T>,
    fill: FillMode,
}

/// A lookup table whose samples are drawn from a bounded allocator.
///
/// The buffer is accounted in the allocator's ledger under the table's name
/// for as long as the table lives. There is no `Clone`: copies go through
/// [`LookupTable::try_clone`], which allocates a fresh buffer, so two tables
/// never share storage.
///
/// # Examples
///
/// ```
/// use knotwork_ledger::{AlwaysReject, BoundedAllocator};
/// use knotwork_table::{LookupTable, SampleTable};
///
/// let alloc = BoundedAllocator::new(Box::new(AlwaysReject));
/// let sq = LookupTable::sampled(&alloc, "x^2", 0.0f64, 4.0, 5, |x| x * x).unwrap();
///
/// assert_eq!(sq.read(1.5).unwrap(), 2.5); // halfway between 1 and 4
/// assert_eq!(sq.table(4).unwrap(), 16.0);
/// assert_eq!(alloc.ledger().current_bytes(), 5 * 8);
/// ```
pub struct LookupTable<T: Sample> {
    name: String,
    allocator: SharedAllocator,
    state: Option<Filled<T>>,
}

impl<T: Sample> LookupTable<T> {
    /// An uninitialised table. Nothing is allocated until one of the
    /// `initialize_*` methods succeeds.
    pub fn empty(allocator: &SharedAllocator, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allocator: Rc::clone(allocator),
            state: None,
        }
    }

    /// Sample `f` at `n` knots across `[min, max]`.
    ///
    /// `f` is called exactly `n` times, in knot order.
    pub fn sampled<F>(
        allocator: &SharedAllocator,
        name: impl Into<String>,
        min: T,
        max: T,
        n: usize,
        f: F,
    ) -> Result<Self, TableError>
    where
        F: FnMut(T) -> T,
    {
        let mut table = Self::empty(allocator, name);
        table.initialize_sampled(min, max, n, f)?;
        Ok(table)
    }

    /// A zero-filled table of `n` knots across `[min, max]`, populated by
    /// the caller with [`SampleTable::set`].
    pub fn manual(
        allocator: &SharedAllocator,
        name: impl Into<String>,
        min: T,
        max: T,
        n: usize,
    ) -> Result<Self, TableError> {
        let mut table = Self::empty(allocator, name);
        table.initialize_manual(min, max, n)?;
        Ok(table)
    }

    /// (Re)initialise by sampling `f` at `n` knots across `[min, max]`.
    ///
    /// The grid is validated before anything is released, so a bad `min`,
    /// `max` or `n` leaves the table as it was. Otherwise any previous
    /// buffer is returned to the ledger before the new one is drawn; if that
    /// allocation is rejected the table is left uninitialised.
    pub fn initialize_sampled<F>(
        &mut self,
        min: T,
        max: T,
        n: usize,
        f: F,
    ) -> Result<(), TableError>
    where
        F: FnMut(T) -> T,
    {
        let grid = Grid::new(min, max, n)?;
        let mut samples = self.allocate(&grid)?;
        tracing::debug!(table = %self.name, n, "building lookup table");
        grid.sample_into(&mut samples, f);
        self.state = Some(Filled {
            grid,
            samples,
            fill: FillMode::Sampled,
        });
        tracing::info!(table = %self.name, n, dx = %grid.dx(), "lookup table built");
        Ok(())
    }

    /// (Re)initialise as a zero-filled manual table.
    pub fn initialize_manual(&mut self, min: T, max: T, n: usize) -> Result<(), TableError> {
        let grid = Grid::new(min, max, n)?;
        let samples = self.allocate(&grid)?;
        self.state = Some(Filled {
            grid,
            samples,
            fill: FillMode::Manual,
        });
        tracing::debug!(table = %self.name, n, "manual lookup table allocated");
        Ok(())
    }

    /// Deep copy: a fresh buffer from the same allocator, same values.
    ///
    /// The copy is accounted separately in the ledger, and mutating or
    /// dropping either table leaves the other untouched.
    pub fn try_clone(&self) -> Result<Self, TableError> {
        let state = match &self.state {
            Some(filled) => Some(Filled {
                grid: filled.grid,
                samples: filled.samples.try_clone()?,
                fill: filled.fill,
            }),
            None => None,
        };
        Ok(Self {
            name: self.name.clone(),
            allocator: Rc::clone(&self.allocator),
            state,
        })
    }

    /// The allocator the samples are drawn from.
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    pub(crate) fn from_parts(
        allocator: &SharedAllocator,
        name: String,
        grid: Grid<T>,
        samples: TrackedBuffer<T>,
        fill: FillMode,
    ) -> Self {
        Self {
            name,
            allocator: Rc::clone(allocator),
            state: Some(Filled {
                grid,
                samples,
                fill,
            }),
        }
    }

    /// Release the previous buffer, then draw a zeroed one for `grid`.
    fn allocate(&mut self, grid: &Grid<T>) -> Result<TrackedBuffer<T>, TableError> {
        self.state = None;
        Ok(self.allocator.allocate_zeroed::<T>(grid.len(), &self.name)?)
    }
}

impl<T: Sample> SampleTable<T> for LookupTable<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn grid(&self) -> Option<&Grid<T>> {
        self.state.as_ref().map(|s| &s.grid)
    }

    fn samples(&self) -> &[T] {
        match &self.state {
            Some(filled) => &filled.samples[..],
            None => &[],
        }
    }

    fn fill_mode(&self) -> Option<FillMode> {
        self.state.as_ref().map(|s| s.fill)
    }

    fn owns_buffer(&self) -> bool {
        true
    }

    fn parts_mut(&mut self) -> Option<(&mut Grid<T>, &mut [T])> {
        self.state
            .as_mut()
            .map(|s| (&mut s.grid, &mut s.samples[..]))
    }
}

impl<T: Sample> Index<usize> for LookupTable<T> {
    type Output = T;

    /// Verbatim sample at knot `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    fn index(&self, i: usize) -> &T {
        &self.samples()[i]
    }
}

impl<T: Sample> fmt::Debug for LookupTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupTable")
            .field("name", &self.name)
            .field("grid", &self.grid())
            .field("fill", &self.fill_mode())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knotwork_core::AllocError;
    use knotwork_ledger::{AlwaysProceed, AlwaysReject, BoundedAllocator};

    fn allocator() -> SharedAllocator {
        BoundedAllocator::new(Box::new(AlwaysReject))
    }

    #[test]
    fn sampled_table_fills_every_knot() {
        let alloc = allocator();
        let t = LookupTable::sampled(&alloc, "lin", 0.0f64, 9.0, 10, |x| 2.0 * x).unwrap();
        assert_eq!(t.len(), 10);
        for i in 0..10 {
            assert_eq!(t[i], 2.0 * i as f64);
        }
        assert_eq!(t.fill_mode(), Some(FillMode::Sampled));
    }

    #[test]
    fn sampling_function_called_exactly_n_times() {
        let alloc = allocator();
        let mut calls = 0;
        let _t = LookupTable::sampled(&alloc, "count", 0.0f64, 1.0, 257, |x| {
            calls += 1;
            x
        })
        .unwrap();
        assert_eq!(calls, 257);
    }

    #[test]
    fn ledger_tracks_table_lifetime() {
        let alloc = allocator();
        {
            let _t = LookupTable::sampled(&alloc, "t", 0.0f32, 1.0, 100, |x| x).unwrap();
            assert_eq!(alloc.ledger().current_bytes(), 400);
            assert_eq!(alloc.ledger().usage_by_label(), vec![("t".to_string(), 400)]);
        }
        assert_eq!(alloc.ledger().current_bytes(), 0);
    }

    #[test]
    fn degenerate_construction_allocates_nothing() {
        let alloc = allocator();
        assert_eq!(
            LookupTable::sampled(&alloc, "n1", 0.0f64, 1.0, 1, |x| x).unwrap_err(),
            TableError::TooFewPoints { n: 1 }
        );
        assert!(matches!(
            LookupTable::<f64>::manual(&alloc, "flat", 2.0, 2.0, 10),
            Err(TableError::InvalidDomain { .. })
        ));
        assert_eq!(alloc.ledger().current_bytes(), 0);
        assert_eq!(alloc.ledger().breach_count(), 0);
    }

    #[test]
    fn manual_table_starts_zeroed_and_accepts_set() {
        let alloc = allocator();
        let mut t = LookupTable::manual(&alloc, "m", 0.0f64, 1.0, 3).unwrap();
        assert!(t.samples().iter().all(|&v| v == 0.0));
        t.set(0, 1.0).unwrap();
        t.set(1, 3.0).unwrap();
        t.set(2, 5.0).unwrap();
        assert_eq!(t.read(0.25).unwrap(), 2.0);
        assert_eq!(
            t.set(3, 0.0).unwrap_err(),
            TableError::IndexOutOfRange { index: 3, len: 3 }
        );
    }

    #[test]
    fn set_on_sampled_table_is_refused() {
        let alloc = allocator();
        let mut t = LookupTable::sampled(&alloc, "s", 0.0f64, 1.0, 3, |x| x).unwrap();
        assert_eq!(
            t.set(0, 9.0).unwrap_err(),
            TableError::NotManualFill { name: "s".into() }
        );
        assert_eq!(t[0], 0.0);
    }

    #[test]
    fn empty_table_reports_not_initialized() {
        let alloc = allocator();
        let mut t = LookupTable::<f64>::empty(&alloc, "e");
        assert!(!t.is_initialized());
        assert!(t.is_empty());
        assert_eq!(
            t.read(0.0).unwrap_err(),
            TableError::NotInitialized { name: "e".into() }
        );
        assert_eq!(
            t.set(0, 1.0).unwrap_err(),
            TableError::NotInitialized { name: "e".into() }
        );
        assert!(t.convert_units(2.0, 2.0).is_err());
        assert_eq!(
            t.table(0).unwrap_err(),
            TableError::IndexOutOfRange { index: 0, len: 0 }
        );
        t.multiply(2.0);
        assert_eq!(alloc.ledger().current_bytes(), 0);
    }

    #[test]
    fn reinitialize_releases_previous_buffer() {
        let alloc = allocator();
        let mut t = LookupTable::sampled(&alloc, "r", 0.0f64, 1.0, 100, |x| x).unwrap();
        assert_eq!(alloc.ledger().current_bytes(), 800);
        t.initialize_manual(0.0, 1.0, 10).unwrap();
        assert_eq!(alloc.ledger().current_bytes(), 80);
        assert_eq!(t.fill_mode(), Some(FillMode::Manual));
    }

    #[test]
    fn failed_reinitialize_keeps_old_table() {
        let alloc = allocator();
        let mut t = LookupTable::sampled(&alloc, "k", 0.0f64, 1.0, 10, |x| x).unwrap();
        assert!(t.initialize_manual(1.0, 0.0, 10).is_err());
        assert_eq!(t.len(), 10);
        assert_eq!(alloc.ledger().current_bytes(), 80);
    }

    #[test]
    fn rejected_allocation_surfaces_as_table_error() {
        let alloc = allocator();
        alloc.ledger().set_max_bytes(64);
        let err = LookupTable::sampled(&alloc, "big", 0.0f64, 1.0, 100, |x| x).unwrap_err();
        assert!(matches!(err, TableError::Alloc(AllocError::LimitRejected { .. })));
        assert_eq!(alloc.ledger().current_bytes(), 0);
    }

    #[test]
    fn proceed_policy_builds_over_limit() {
        let alloc = BoundedAllocator::new(Box::new(AlwaysProceed));
        alloc.ledger().set_max_bytes(64);
        let t = LookupTable::sampled(&alloc, "big", 0.0f64, 1.0, 100, |x| x).unwrap();
        assert_eq!(t.len(), 100);
        assert!(!alloc.ledger().is_under_limit());
    }

    #[test]
    fn try_clone_is_deep() {
        let alloc = allocator();
        let mut a = LookupTable::manual(&alloc, "a", 0.0f64, 1.0, 4).unwrap();
        a.set(1, 1.0).unwrap();
        let mut b = a.try_clone().unwrap();
        b.set(1, 7.0).unwrap();
        b.multiply(2.0);
        assert_eq!(a[1], 1.0);
        assert_eq!(b[1], 14.0);
        assert_eq!(alloc.ledger().current_bytes(), 64);
        drop(a);
        assert_eq!(b[1], 14.0);
        assert_eq!(alloc.ledger().current_bytes(), 32);
    }

    #[test]
    fn try_clone_of_empty_allocates_nothing() {
        let alloc = allocator();
        let a = LookupTable::<f32>::empty(&alloc, "e");
        let b = a.try_clone().unwrap();
        assert!(!b.is_initialized());
        assert_eq!(alloc.ledger().current_bytes(), 0);
    }

    #[test]
    fn report_describes_table() {
        let alloc = allocator();
        let t = LookupTable::sampled(&alloc, "erf()", 0.0f64, 7.0, 10_000, |x| x).unwrap();
        let text = t.report().to_string();
        assert!(text.contains("Name:               erf()"));
        assert!(text.contains("Range:              [0, 7]"));
        assert!(text.contains("Number of points:   10000"));
        assert!(text.contains("KiB (owned)"));
        assert_eq!(t.size_bytes(), 80_000);
    }

    #[test]
    fn report_of_empty_table() {
        let alloc = allocator();
        let t = LookupTable::<f64>::empty(&alloc, "later");
        assert!(t.report().to_string().contains("(not initialised)"));
    }
}
