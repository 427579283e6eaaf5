//! Function-sampling lookup tables for knotwork.
//!
//! A table evaluates a one-argument function at `n` evenly spaced knots
//! across a closed domain once, at construction, and afterwards answers
//! point queries by linear interpolation between the two neighbouring
//! knots in O(1).
//!
//! # Indexing convention
//!
//! A table over `[min, max]` with `n` points stores exactly `n` samples at
//! `x_i = min + i * dx`, `dx = (max - min) / (n - 1)`. Interpolated reads
//! accept `x` in the half-open interval `[min, max)`; the value at `max`
//! itself is the last knot, read with `table(n - 1)`.
//!
//! # Ownership
//!
//! - [`LookupTable`] owns its samples: they are drawn from a
//!   [`BoundedAllocator`](knotwork_ledger::BoundedAllocator) and returned to
//!   its ledger when the table is dropped. Copies are explicit and deep
//!   ([`LookupTable::try_clone`]).
//! - [`BorrowedTable`] adopts a caller-provided slice for its lifetime and
//!   never allocates or frees.
//!
//! Both implement [`SampleTable`], which carries the query and mutation API.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod borrowed;
pub mod grid;
pub mod owned;
pub mod sample;
pub mod table;

pub use borrowed::BorrowedTable;
pub use grid::Grid;
pub use owned::LookupTable;
pub use sample::Sample;
pub use table::{FillMode, SampleTable, TableReport};
