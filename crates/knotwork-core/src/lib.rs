//! Core types for the knotwork numeric utilities.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! byte-unit conversion factors, the byte-size display adapters used by
//! every diagnostic report, and the error types shared by the allocator
//! and lookup-table crates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod units;

pub use error::{AllocError, TableError};
pub use units::{ByteSize, HumanBytes};
