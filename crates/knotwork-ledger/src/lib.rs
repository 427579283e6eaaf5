//! Allocation ledger and bounded allocator for knotwork.
//!
//! Every heap buffer a lookup table owns is obtained here. The allocator
//! consults a [`Ledger`] before and after touching the global allocator,
//! so the outstanding byte total is always known and an allocation that
//! would cross the configured ceiling is routed through an injectable
//! [`OverLimitPolicy`] instead of a terminal prompt.
//!
//! # Architecture
//!
//! ```text
//! SharedAllocator = Rc<BoundedAllocator>
//! ├── Ledger (allocated bytes, ceiling, per-label breakdown)
//! ├── Box<dyn OverLimitPolicy> (Abort / Proceed / Reject)
//! └── hands out TrackedBuffer<T>
//!     └── RawBuffer<T> (zeroed global allocation, released on drop)
//! ```
//!
//! This crate is the only one in the workspace that contains `unsafe`
//! code, confined to the private `raw` module.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod allocator;
pub mod config;
pub mod ledger;
pub mod policy;
mod raw;

pub use allocator::{BoundedAllocator, SharedAllocator, TrackedBuffer};
pub use config::{AllocatorConfig, ConfigError, MemoryLimit, PolicyKind};
pub use ledger::{Ledger, LedgerReport, LimitStatus};
pub use policy::{
    AbortOnBreach, AlwaysProceed, AlwaysReject, ConfirmPolicy, LimitBreach, LimitDecision,
    OverLimitPolicy,
};
pub use raw::Zeroable;
