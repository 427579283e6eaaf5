//! The bounded allocator and the buffers it hands out.
//!
//! [`BoundedAllocator`] is the sanctioned way for the rest of the workspace
//! to touch the heap. An allocation runs in a fixed order:
//!
//! 1. compute the byte size, rejecting overflow before the allocator is
//!    consulted,
//! 2. project it against the ledger ceiling and, on breach, apply the
//!    [`OverLimitPolicy`],
//! 3. take zeroed memory from the global allocator (failure is fatal),
//! 4. record the bytes in the ledger.
//!
//! The returned [`TrackedBuffer`] gives the bytes back to the ledger when
//! it is dropped or passed to [`BoundedAllocator::free`].

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use knotwork_core::{AllocError, ByteSize};

use crate::config::{AllocatorConfig, ConfigError};
use crate::ledger::Ledger;
use crate::policy::{LimitBreach, LimitDecision, OverLimitPolicy};
use crate::raw::{RawBuffer, Zeroable};

/// Shared handle to a [`BoundedAllocator`].
///
/// Every [`TrackedBuffer`] keeps one, so the allocator outlives all the
/// buffers drawn from it.
pub type SharedAllocator = Rc<BoundedAllocator>;

/// Checked zeroed allocation with ledger accounting and an over-limit policy.
///
/// # Examples
///
/// ```
/// use knotwork_ledger::{AlwaysReject, BoundedAllocator};
///
/// let alloc = BoundedAllocator::new(Box::new(AlwaysReject));
/// alloc.ledger().set_max_kib(1.0);
///
/// let buf = alloc.allocate_zeroed::<f64>(64, "scratch").unwrap();
/// assert_eq!(alloc.ledger().current_bytes(), 512);
/// assert!(alloc.allocate_zeroed::<f64>(128, "scratch").is_err());
///
/// drop(buf);
/// assert_eq!(alloc.ledger().current_bytes(), 0);
/// ```
pub struct BoundedAllocator {
    ledger: Ledger,
    // Empty only while the policy is deciding.
    policy: RefCell<Option<Box<dyn OverLimitPolicy>>>,
}

impl BoundedAllocator {
    /// Create an allocator with an unlimited ledger and the given policy.
    pub fn new(policy: Box<dyn OverLimitPolicy>) -> SharedAllocator {
        Self::with_ledger(Ledger::new(), policy)
    }

    /// Create an allocator over an existing ledger.
    pub fn with_ledger(ledger: Ledger, policy: Box<dyn OverLimitPolicy>) -> SharedAllocator {
        Rc::new(Self {
            ledger,
            policy: RefCell::new(Some(policy)),
        })
    }

    /// Build an allocator from a validated configuration.
    pub fn from_config(config: &AllocatorConfig) -> Result<SharedAllocator, ConfigError> {
        let max_bytes = config.limit.resolve()?;
        Ok(Self::with_ledger(
            Ledger::with_limit(max_bytes),
            config.policy.build(),
        ))
    }

    /// The accounting context of this allocator.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Swap in a different over-limit policy, returning the previous one.
    ///
    /// Returns `None` when called from inside the current policy's
    /// decision; the new policy then takes over once that decision returns.
    pub fn replace_policy(
        &self,
        policy: Box<dyn OverLimitPolicy>,
    ) -> Option<Box<dyn OverLimitPolicy>> {
        self.policy.replace(Some(policy))
    }

    /// Allocate `count` zero-initialised elements of `T` under `label`.
    ///
    /// Returns `Err(AllocError::SizeOverflow)` if the byte size does not fit
    /// a layout, or `Err(AllocError::LimitRejected)` if the allocation would
    /// breach the ceiling and the policy says [`LimitDecision::Reject`].
    ///
    /// The process terminates if the policy says [`LimitDecision::Abort`] or
    /// the global allocator fails. A null buffer is never returned.
    pub fn allocate_zeroed<T: Zeroable>(
        self: &Rc<Self>,
        count: usize,
        label: &str,
    ) -> Result<TrackedBuffer<T>, AllocError> {
        let layout = RawBuffer::<T>::layout(count)?;
        let requested = layout.size() as u64;

        if self.ledger.would_breach(requested) {
            let breach = LimitBreach {
                label: label.to_owned(),
                requested,
                current: self.ledger.current_bytes(),
                limit: self.ledger.max_bytes(),
            };
            tracing::warn!(
                label,
                requested = %ByteSize(breach.requested),
                current = %ByteSize(breach.current),
                limit = %ByteSize(breach.limit),
                "allocation would exceed memory limit"
            );
            self.ledger.record_breach();
            let decision = self.decide(&breach);
            match decision {
                LimitDecision::Proceed => {
                    tracing::warn!(label, "continuing over memory limit");
                }
                LimitDecision::Reject => {
                    return Err(AllocError::LimitRejected {
                        label: breach.label,
                        requested: breach.requested,
                        current: breach.current,
                        limit: breach.limit,
                    });
                }
                LimitDecision::Abort => {
                    tracing::error!(label, "memory limit exceeded, aborting");
                    std::process::abort();
                }
            }
        }

        let raw = RawBuffer::zeroed(layout, count);
        self.ledger.add(requested, label);
        Ok(TrackedBuffer {
            raw,
            label: label.to_owned(),
            allocator: Rc::clone(self),
        })
    }

    /// Ask the policy about `breach`.
    ///
    /// The policy is taken out of its cell for the call, so it may allocate
    /// from this allocator or replace itself. A breach raised from inside
    /// the policy's own decision has no policy to ask and is rejected.
    fn decide(&self, breach: &LimitBreach) -> LimitDecision {
        let Some(mut policy) = self.policy.borrow_mut().take() else {
            tracing::warn!(
                label = %breach.label,
                "over-limit policy re-entered its allocator, rejecting"
            );
            return LimitDecision::Reject;
        };
        let decision = policy.decide(breach);
        let mut slot = self.policy.borrow_mut();
        if slot.is_none() {
            *slot = Some(policy);
        }
        decision
    }

    /// Release `slot`'s buffer, if any, and leave `None` behind.
    ///
    /// Calling this again on the emptied slot does nothing.
    pub fn free<T: Zeroable>(&self, slot: &mut Option<TrackedBuffer<T>>) {
        if let Some(buffer) = slot.take() {
            debug_assert!(
                std::ptr::eq(Rc::as_ptr(&buffer.allocator), self),
                "buffer freed through a foreign allocator"
            );
            drop(buffer);
        }
    }
}

impl fmt::Debug for BoundedAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedAllocator")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

/// A zero-initialised buffer of `T` whose bytes are recorded in a ledger.
///
/// Exclusively owned: there is no `Clone`, so two buffers can never alias.
/// Use [`TrackedBuffer::try_clone`] for an independently accounted copy.
/// Dropping the buffer releases the memory and removes exactly
/// `len * size_of::<T>()` bytes from the ledger.
pub struct TrackedBuffer<T: Zeroable> {
    raw: RawBuffer<T>,
    label: String,
    allocator: SharedAllocator,
}

impl<T: Zeroable> TrackedBuffer<T> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Bytes accounted for this buffer.
    pub fn size_bytes(&self) -> u64 {
        (self.raw.len() * std::mem::size_of::<T>()) as u64
    }

    /// Label the buffer was allocated under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The allocator this buffer was drawn from.
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Allocate a fresh buffer from the same allocator and copy the contents.
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        let mut copy = self.allocator.allocate_zeroed::<T>(self.len(), &self.label)?;
        copy.copy_from_slice(self);
        Ok(copy)
    }
}

impl<T: Zeroable> Deref for TrackedBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.raw.as_slice()
    }
}

impl<T: Zeroable> DerefMut for TrackedBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.raw.as_mut_slice()
    }
}

impl<T: Zeroable> Drop for TrackedBuffer<T> {
    fn drop(&mut self) {
        self.allocator.ledger.remove(self.size_bytes(), &self.label);
    }
}

impl<T: Zeroable + fmt::Debug> fmt::Debug for TrackedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedBuffer")
            .field("label", &self.label)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
