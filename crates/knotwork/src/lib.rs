//! Knotwork: ledger-bounded allocation and function-sampling lookup tables.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the knotwork sub-crates. For most users, adding `knotwork` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use knotwork::prelude::*;
//!
//! // A 1 MiB budget; over-limit requests are refused rather than aborting.
//! let alloc = BoundedAllocator::from_config(
//!     &AllocatorConfig::new()
//!         .with_limit(MemoryLimit::MiB(1.0))
//!         .with_policy(PolicyKind::Reject),
//! )
//! .unwrap();
//!
//! let cos = LookupTable::sampled(&alloc, "cos()", 0.0, std::f64::consts::TAU, 10_000, f64::cos)
//!     .unwrap();
//! assert!((cos.read(std::f64::consts::PI).unwrap() + 1.0).abs() < 1e-7);
//! assert_eq!(alloc.ledger().current_bytes(), 80_000);
//!
//! // The value at the upper bound is the last knot, not an interpolated read.
//! assert!(cos.read(std::f64::consts::TAU).is_err());
//! assert!((cos.table(9_999).unwrap() - 1.0).abs() < 1e-12);
//!
//! // A second table that would blow the budget is rejected.
//! let err = LookupTable::sampled(&alloc, "sin()", 0.0, 1.0, 200_000, f64::sin).unwrap_err();
//! assert!(matches!(err, TableError::Alloc(AllocError::LimitRejected { .. })));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`units`] | `knotwork-core` | Byte-unit conversions, error types |
//! | [`ledger`] | `knotwork-ledger` | Ledger, over-limit policies, bounded allocator |
//! | [`table`] | `knotwork-table` | Grids, owning and borrowing lookup tables |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Byte-unit conversions and shared error types (`knotwork-core`).
pub use knotwork_core as units;

/// Allocation accounting and the bounded allocator (`knotwork-ledger`).
///
/// [`ledger::BoundedAllocator`] hands out [`ledger::TrackedBuffer`]s and
/// routes ceiling breaches to an [`ledger::OverLimitPolicy`].
pub use knotwork_ledger as ledger;

/// Lookup tables (`knotwork-table`).
///
/// [`table::LookupTable`] owns its samples; [`table::BorrowedTable`]
/// adopts a caller slice. Both implement [`table::SampleTable`].
pub use knotwork_table as table;

/// Common imports for typical knotwork usage.
///
/// ```rust
/// use knotwork::prelude::*;
/// ```
pub mod prelude {
    // Errors and units
    pub use knotwork_core::{AllocError, ByteSize, HumanBytes, TableError};

    // Allocation
    pub use knotwork_ledger::{
        AllocatorConfig, BoundedAllocator, LimitBreach, LimitDecision, MemoryLimit,
        OverLimitPolicy, PolicyKind, SharedAllocator,
    };

    // Tables
    pub use knotwork_table::{BorrowedTable, LookupTable, SampleTable};
}
