//! Allocator configuration, validation, and error types.
//!
//! [`AllocatorConfig`] is the builder input for
//! [`BoundedAllocator::from_config`](crate::BoundedAllocator::from_config).
//! Limits may be given in any unit; [`MemoryLimit::resolve`] checks them and
//! converts to whole bytes.

use std::error::Error;
use std::fmt;

use knotwork_core::units;

use crate::ledger::Ledger;
use crate::policy::{AbortOnBreach, AlwaysProceed, AlwaysReject, OverLimitPolicy};

// ── MemoryLimit ────────────────────────────────────────────────────

/// Ceiling for a ledger, in the unit it was specified in.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum MemoryLimit {
    /// No ceiling.
    #[default]
    Unlimited,
    /// Whole bytes.
    Bytes(u64),
    /// Kibibytes.
    KiB(f64),
    /// Mebibytes.
    MiB(f64),
    /// Gibibytes.
    GiB(f64),
}

impl MemoryLimit {
    /// Convert to a byte ceiling ([`Ledger::UNLIMITED`] for `Unlimited`).
    ///
    /// Fractional units must be finite and non-negative; the result is
    /// truncated to whole bytes.
    pub fn resolve(&self) -> Result<u64, ConfigError> {
        let (value, unit, to_bytes): (f64, &'static str, fn(f64) -> u64) = match *self {
            Self::Unlimited => return Ok(Ledger::UNLIMITED),
            Self::Bytes(bytes) => return Ok(bytes),
            Self::KiB(v) => (v, "KiB", units::kib_to_bytes),
            Self::MiB(v) => (v, "MiB", units::mib_to_bytes),
            Self::GiB(v) => (v, "GiB", units::gib_to_bytes),
        };
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidLimit { value, unit });
        }
        Ok(to_bytes(value))
    }
}

// ── PolicyKind ─────────────────────────────────────────────────────

/// Built-in over-limit policies selectable from configuration.
///
/// Custom policies (closures, [`ConfirmPolicy`](crate::ConfirmPolicy)) are
/// passed to [`BoundedAllocator::new`](crate::BoundedAllocator::new) directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolicyKind {
    /// Refuse breaching allocations with an error. Default.
    #[default]
    Reject,
    /// Allow breaching allocations.
    Proceed,
    /// Terminate the process on breach.
    Abort,
}

impl PolicyKind {
    /// Instantiate the policy.
    pub fn build(self) -> Box<dyn OverLimitPolicy> {
        match self {
            Self::Reject => Box::new(AlwaysReject),
            Self::Proceed => Box::new(AlwaysProceed),
            Self::Abort => Box::new(AbortOnBreach),
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while resolving an [`AllocatorConfig`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A fractional limit was negative, NaN, or infinite.
    InvalidLimit {
        /// The offending value.
        value: f64,
        /// Unit it was given in.
        unit: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLimit { value, unit } => {
                write!(f, "memory limit must be finite and non-negative, got {value} {unit}")
            }
        }
    }
}

impl Error for ConfigError {}

// ── AllocatorConfig ────────────────────────────────────────────────

/// Configuration for a [`BoundedAllocator`](crate::BoundedAllocator).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AllocatorConfig {
    /// Ledger ceiling. Default: unlimited.
    pub limit: MemoryLimit,
    /// What to do when an allocation would reach the ceiling. Default: reject.
    pub policy: PolicyKind,
}

impl AllocatorConfig {
    /// Unlimited ledger with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ceiling.
    pub fn with_limit(mut self, limit: MemoryLimit) -> Self {
        self.limit = limit;
        self
    }

    /// Set the over-limit policy.
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    /// Check the configuration without building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limit.resolve().map(|_| ())
    }
}
