//! Outstanding-allocation accounting with a soft ceiling.
//!
//! A [`Ledger`] is an explicit accounting context: every allocator owns one,
//! and tables built against different allocators draw on independent
//! budgets. It records bytes, it never allocates.

use std::cell::{Cell, RefCell};
use std::fmt;

use indexmap::IndexMap;
use knotwork_core::units::{self, ByteSize};

/// Result of [`Ledger::verify_limit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitStatus {
    /// Outstanding bytes are strictly below the ceiling.
    Under,
    /// Outstanding bytes have reached or passed the ceiling.
    Over,
}

/// Running total of outstanding allocated bytes plus a configurable ceiling.
///
/// Single-threaded by design: counters use `Cell`, so a `&Ledger` is enough
/// to record allocations and the type is `!Sync`.
///
/// # Examples
///
/// ```
/// use knotwork_ledger::Ledger;
///
/// let ledger = Ledger::new();
/// ledger.set_max_kib(1.0);
/// ledger.add(1000, "scratch");
/// assert!(ledger.is_under_limit());
/// ledger.add(24, "scratch");
/// assert!(!ledger.is_under_limit()); // the ceiling itself is not "under"
/// ledger.remove(1024, "scratch");
/// assert_eq!(ledger.current_bytes(), 0);
/// ```
#[derive(Debug)]
pub struct Ledger {
    allocated_bytes: Cell<u64>,
    max_bytes: Cell<u64>,
    breaches: Cell<u64>,
    /// Outstanding bytes per allocation label, in first-seen order.
    by_label: RefCell<IndexMap<String, u64>>,
}

impl Ledger {
    /// Ceiling sentinel meaning "no limit".
    pub const UNLIMITED: u64 = u64::MAX;

    /// Create an empty ledger with no ceiling.
    pub fn new() -> Self {
        Self::with_limit(Self::UNLIMITED)
    }

    /// Create an empty ledger with the given ceiling in bytes.
    pub fn with_limit(max_bytes: u64) -> Self {
        Self {
            allocated_bytes: Cell::new(0),
            max_bytes: Cell::new(max_bytes),
            breaches: Cell::new(0),
            by_label: RefCell::new(IndexMap::new()),
        }
    }

    /// Set the ceiling in bytes. [`Ledger::UNLIMITED`] removes it.
    pub fn set_max_bytes(&self, bytes: u64) {
        self.max_bytes.set(bytes);
    }

    /// Set the ceiling in KiB (truncated to whole bytes).
    pub fn set_max_kib(&self, kib: f64) {
        self.set_max_bytes(units::kib_to_bytes(kib));
    }

    /// Set the ceiling in MiB (truncated to whole bytes).
    pub fn set_max_mib(&self, mib: f64) {
        self.set_max_bytes(units::mib_to_bytes(mib));
    }

    /// Set the ceiling in GiB (truncated to whole bytes).
    pub fn set_max_gib(&self, gib: f64) {
        self.set_max_bytes(units::gib_to_bytes(gib));
    }

    /// Remove the ceiling.
    pub fn clear_limit(&self) {
        self.set_max_bytes(Self::UNLIMITED);
    }

    /// Whether no ceiling is configured.
    pub fn is_unlimited(&self) -> bool {
        self.max_bytes.get() == Self::UNLIMITED
    }

    /// Bytes currently outstanding.
    pub fn current_bytes(&self) -> u64 {
        self.allocated_bytes.get()
    }

    /// Bytes currently outstanding, in KiB.
    pub fn current_kib(&self) -> f64 {
        units::bytes_to_kib(self.current_bytes())
    }

    /// Bytes currently outstanding, in MiB.
    pub fn current_mib(&self) -> f64 {
        units::bytes_to_mib(self.current_bytes())
    }

    /// Bytes currently outstanding, in GiB.
    pub fn current_gib(&self) -> f64 {
        units::bytes_to_gib(self.current_bytes())
    }

    /// The ceiling in bytes ([`Ledger::UNLIMITED`] when none is set).
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes.get()
    }

    /// The ceiling in KiB.
    pub fn max_kib(&self) -> f64 {
        units::bytes_to_kib(self.max_bytes())
    }

    /// The ceiling in MiB.
    pub fn max_mib(&self) -> f64 {
        units::bytes_to_mib(self.max_bytes())
    }

    /// The ceiling in GiB.
    pub fn max_gib(&self) -> f64 {
        units::bytes_to_gib(self.max_bytes())
    }

    /// True iff outstanding bytes are strictly below the ceiling.
    ///
    /// Without a ceiling this is always true.
    pub fn is_under_limit(&self) -> bool {
        self.is_unlimited() || self.current_bytes() < self.max_bytes()
    }

    /// Whether adding `requested` bytes would leave the ledger at or over
    /// its ceiling.
    pub fn would_breach(&self, requested: u64) -> bool {
        if self.is_unlimited() {
            return false;
        }
        self.current_bytes().saturating_add(requested) >= self.max_bytes()
    }

    /// Record `bytes` as allocated under `label`.
    pub fn add(&self, bytes: u64, label: &str) {
        self.allocated_bytes
            .set(self.allocated_bytes.get().saturating_add(bytes));
        let mut by_label = self.by_label.borrow_mut();
        match by_label.get_mut(label) {
            Some(total) => *total = total.saturating_add(bytes),
            None => {
                by_label.insert(label.to_owned(), bytes);
            }
        }
    }

    /// Record `bytes` under `label` as released.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` exceeds the outstanding total. Releasing more than
    /// was recorded is an accounting bug.
    pub fn remove(&self, bytes: u64, label: &str) {
        let current = self.allocated_bytes.get();
        let Some(remaining) = current.checked_sub(bytes) else {
            panic!("ledger underflow: removing {bytes} bytes with only {current} outstanding");
        };
        self.allocated_bytes.set(remaining);

        let mut by_label = self.by_label.borrow_mut();
        if let Some(total) = by_label.get_mut(label) {
            *total = total.saturating_sub(bytes);
            if *total == 0 {
                by_label.shift_remove(label);
            }
        }
    }

    /// Note that the over-limit path was taken once.
    pub fn record_breach(&self) {
        self.breaches.set(self.breaches.get() + 1);
    }

    /// Number of allocations that took the over-limit path.
    pub fn breach_count(&self) -> u64 {
        self.breaches.get()
    }

    /// Outstanding bytes per label, in first-allocation order.
    pub fn usage_by_label(&self) -> Vec<(String, u64)> {
        self.by_label
            .borrow()
            .iter()
            .map(|(label, &bytes)| (label.clone(), bytes))
            .collect()
    }

    /// Re-check the ceiling and log the outcome.
    ///
    /// Over the ceiling a warning is emitted with current usage and limit;
    /// otherwise a debug event. Never blocks.
    pub fn verify_limit(&self) -> LimitStatus {
        if self.is_under_limit() {
            tracing::debug!(
                current = %ByteSize(self.current_bytes()),
                limit = %ByteSize(self.max_bytes()),
                "memory usage within limit"
            );
            LimitStatus::Under
        } else {
            tracing::warn!(
                current = %ByteSize(self.current_bytes()),
                limit = %ByteSize(self.max_bytes()),
                "memory usage over limit"
            );
            LimitStatus::Over
        }
    }

    /// A displayable summary of current and maximum usage.
    pub fn report(&self) -> LedgerReport<'_> {
        LedgerReport { ledger: self }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Multi-line usage summary produced by [`Ledger::report`].
pub struct LedgerReport<'a> {
    ledger: &'a Ledger,
}

impl fmt::Display for LedgerReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = self.ledger;
        writeln!(f, "Memory allocated:       {}", ByteSize(ledger.current_bytes()))?;
        if ledger.is_unlimited() {
            writeln!(f, "Maximum memory allowed: unlimited")?;
        } else {
            writeln!(f, "Maximum memory allowed: {}", ByteSize(ledger.max_bytes()))?;
        }
        for (label, bytes) in ledger.by_label.borrow().iter() {
            writeln!(f, "    {label:<20} {}", ByteSize(*bytes))?;
        }
        Ok(())
    }
}
