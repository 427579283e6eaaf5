//! Test utilities and fixtures for knotwork development.
//!
//! - [`RecordingPolicy`]: an over-limit policy that answers with a fixed
//!   decision and remembers every breach it was shown.
//! - [`EvalCounter`]: wraps a sampling function and counts evaluations.
//! - Allocator constructors for the common test setups.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use knotwork_ledger::{
    AlwaysReject, BoundedAllocator, LimitBreach, LimitDecision, OverLimitPolicy, SharedAllocator,
};

/// Over-limit policy returning a fixed decision and recording each breach.
///
/// Clones share their record, so keep one clone for assertions and box the
/// other into the allocator:
///
/// ```
/// use knotwork_ledger::{BoundedAllocator, LimitDecision};
/// use knotwork_test_utils::RecordingPolicy;
///
/// let policy = RecordingPolicy::new(LimitDecision::Reject);
/// let alloc = BoundedAllocator::new(Box::new(policy.clone()));
/// alloc.ledger().set_max_bytes(1);
/// assert!(alloc.allocate_zeroed::<u8>(8, "x").is_err());
/// assert_eq!(policy.calls(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct RecordingPolicy {
    decision: LimitDecision,
    calls: Rc<Cell<usize>>,
    breaches: Rc<RefCell<Vec<LimitBreach>>>,
}

impl RecordingPolicy {
    pub fn new(decision: LimitDecision) -> Self {
        Self {
            decision,
            calls: Rc::new(Cell::new(0)),
            breaches: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// How many times the allocator asked for a decision.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Every breach shown so far, oldest first.
    pub fn breaches(&self) -> Vec<LimitBreach> {
        self.breaches.borrow().clone()
    }

    pub fn last_breach(&self) -> Option<LimitBreach> {
        self.breaches.borrow().last().cloned()
    }
}

impl OverLimitPolicy for RecordingPolicy {
    fn decide(&mut self, breach: &LimitBreach) -> LimitDecision {
        self.calls.set(self.calls.get() + 1);
        self.breaches.borrow_mut().push(breach.clone());
        self.decision
    }
}

/// Counts how often a wrapped sampling function is evaluated.
#[derive(Clone, Debug, Default)]
pub struct EvalCounter(Rc<Cell<usize>>);

impl EvalCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.get()
    }

    /// Wrap `f` so every call bumps this counter.
    pub fn wrap<T, F>(&self, mut f: F) -> impl FnMut(T) -> T
    where
        F: FnMut(T) -> T,
    {
        let count = Rc::clone(&self.0);
        move |x| {
            count.set(count.get() + 1);
            f(x)
        }
    }
}

/// An allocator with no ceiling that rejects nothing.
pub fn unlimited_allocator() -> SharedAllocator {
    BoundedAllocator::new(Box::new(AlwaysReject))
}

/// An allocator capped at `max_bytes` that rejects breaching requests.
pub fn capped_allocator(max_bytes: u64) -> SharedAllocator {
    let alloc = BoundedAllocator::new(Box::new(AlwaysReject));
    alloc.ledger().set_max_bytes(max_bytes);
    alloc
}

/// An allocator capped at `max_bytes` whose breaches go to `policy`.
pub fn recording_allocator(max_bytes: u64, policy: &RecordingPolicy) -> SharedAllocator {
    let alloc = BoundedAllocator::new(Box::new(policy.clone()));
    alloc.ledger().set_max_bytes(max_bytes);
    alloc
}
