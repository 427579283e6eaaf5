//! Error types for the knotwork allocator and lookup tables.
//!
//! Allocator failures that cannot be recovered (the global allocator
//! returning null, a policy deciding to abort) never surface here: they
//! end the process. Everything in this module is a reportable, recoverable
//! condition.

use std::error::Error;
use std::fmt;

/// Errors from the bounded allocator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// `count * element_size` does not fit in a valid allocation layout.
    /// Rejected before the underlying allocator is consulted.
    SizeOverflow {
        /// Requested element count.
        count: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },
    /// The allocation would breach the ledger ceiling and the over-limit
    /// policy rejected it. The ledger is unchanged.
    LimitRejected {
        /// Label the allocation was requested under.
        label: String,
        /// Number of bytes requested.
        requested: u64,
        /// Bytes outstanding at the time of the request.
        current: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeOverflow {
                count,
                element_size,
            } => {
                write!(
                    f,
                    "allocation size overflow: {count} elements of {element_size} bytes"
                )
            }
            Self::LimitRejected {
                label,
                requested,
                current,
                limit,
            } => {
                write!(
                    f,
                    "allocation '{label}' rejected: requested {requested} bytes with \
                     {current} bytes in use, limit {limit} bytes"
                )
            }
        }
    }
}

impl Error for AllocError {}

/// Errors from lookup-table construction, queries and mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum TableError {
    /// Fewer than two sample points: there is no interpolation interval.
    TooFewPoints {
        /// The requested point count.
        n: usize,
    },
    /// Domain bounds are not finite or `min >= max`.
    InvalidDomain {
        /// Lower bound as given.
        min: f64,
        /// Upper bound as given.
        max: f64,
    },
    /// The table has not been initialised yet.
    NotInitialized {
        /// Table name.
        name: String,
    },
    /// Knot index outside `0..len`.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of stored samples.
        len: usize,
    },
    /// Query point outside the readable domain (or not finite).
    OutOfDomain {
        /// The offending query point.
        x: f64,
        /// Lower bound of the domain.
        min: f64,
        /// Upper bound of the domain.
        max: f64,
    },
    /// `set` was called on a table filled from a sampling function.
    NotManualFill {
        /// Table name.
        name: String,
    },
    /// An adopted external buffer is shorter than the requested point count.
    BufferTooShort {
        /// Points requested.
        needed: usize,
        /// Length of the supplied buffer.
        len: usize,
    },
    /// A unit-conversion scale factor was zero, negative, not finite, or
    /// would leave the grid without finite bounds and spacing.
    InvalidScale {
        /// The offending factor.
        scale: f64,
    },
    /// The sample buffer could not be allocated.
    Alloc(AllocError),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints { n } => {
                write!(f, "lookup table needs at least 2 points, got {n}")
            }
            Self::InvalidDomain { min, max } => {
                write!(f, "invalid domain [{min}, {max}]: bounds must be finite with min < max")
            }
            Self::NotInitialized { name } => {
                write!(f, "lookup table '{name}' is not initialised")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "knot index {index} out of range for {len} samples")
            }
            Self::OutOfDomain { x, min, max } => {
                write!(f, "query point {x} outside readable domain [{min}, {max})")
            }
            Self::NotManualFill { name } => {
                write!(f, "lookup table '{name}' was filled by sampling; set() is not permitted")
            }
            Self::BufferTooShort { needed, len } => {
                write!(f, "external buffer holds {len} values, {needed} needed")
            }
            Self::InvalidScale { scale } => {
                write!(f, "scale factor {scale} must be finite, positive and keep the grid representable")
            }
            Self::Alloc(e) => write!(f, "sample buffer: {e}"),
        }
    }
}

impl Error for TableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Alloc(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AllocError> for TableError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}
