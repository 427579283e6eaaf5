//! Byte-unit conversion factors and byte-size display adapters.
//!
//! All units are binary multiples: 1 KiB = 1024 B, 1 MiB = 1024 KiB,
//! 1 GiB = 1024 MiB. Every factor is a power of two, so conversions between
//! fractional units are exact in `f64`; only the final cast to a byte count
//! truncates.

use std::fmt;

/// Bytes → KiB.
pub const B_TO_KIB: f64 = 1.0 / 1024.0;
/// Bytes → MiB.
pub const B_TO_MIB: f64 = B_TO_KIB / 1024.0;
/// Bytes → GiB.
pub const B_TO_GIB: f64 = B_TO_MIB / 1024.0;
/// KiB → bytes.
pub const KIB_TO_B: f64 = 1024.0;
/// KiB → MiB.
pub const KIB_TO_MIB: f64 = 1.0 / 1024.0;
/// KiB → GiB.
pub const KIB_TO_GIB: f64 = KIB_TO_MIB / 1024.0;
/// MiB → bytes.
pub const MIB_TO_B: f64 = 1024.0 * 1024.0;
/// MiB → KiB.
pub const MIB_TO_KIB: f64 = 1024.0;
/// MiB → GiB.
pub const MIB_TO_GIB: f64 = 1.0 / 1024.0;
/// GiB → bytes.
pub const GIB_TO_B: f64 = 1024.0 * 1024.0 * 1024.0;
/// GiB → KiB.
pub const GIB_TO_KIB: f64 = 1024.0 * 1024.0;
/// GiB → MiB.
pub const GIB_TO_MIB: f64 = 1024.0;

/// Convert a byte count to KiB.
pub fn bytes_to_kib(bytes: u64) -> f64 {
    bytes as f64 * B_TO_KIB
}

/// Convert a byte count to MiB.
pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 * B_TO_MIB
}

/// Convert a byte count to GiB.
pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 * B_TO_GIB
}

/// Convert KiB to a byte count, truncating any fractional byte.
///
/// Negative and NaN inputs saturate to 0, values past `u64::MAX` to `u64::MAX`.
pub fn kib_to_bytes(kib: f64) -> u64 {
    (kib * KIB_TO_B) as u64
}

/// Convert MiB to a byte count, truncating any fractional byte.
pub fn mib_to_bytes(mib: f64) -> u64 {
    (mib * MIB_TO_B) as u64
}

/// Convert GiB to a byte count, truncating any fractional byte.
pub fn gib_to_bytes(gib: f64) -> u64 {
    (gib * GIB_TO_B) as u64
}

/// KiB → MiB.
pub fn kib_to_mib(kib: f64) -> f64 {
    kib * KIB_TO_MIB
}

/// KiB → GiB.
pub fn kib_to_gib(kib: f64) -> f64 {
    kib * KIB_TO_GIB
}

/// MiB → KiB.
pub fn mib_to_kib(mib: f64) -> f64 {
    mib * MIB_TO_KIB
}

/// MiB → GiB.
pub fn mib_to_gib(mib: f64) -> f64 {
    mib * MIB_TO_GIB
}

/// GiB → KiB.
pub fn gib_to_kib(gib: f64) -> f64 {
    gib * GIB_TO_KIB
}

/// GiB → MiB.
pub fn gib_to_mib(gib: f64) -> f64 {
    gib * GIB_TO_MIB
}

/// Displays a byte count in every unit at once.
///
/// ```
/// use knotwork_core::ByteSize;
///
/// assert_eq!(
///     ByteSize(2048).to_string(),
///     "2048 bytes (2.000 KiB, 0.002 MiB, 0.000 GiB)",
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteSize(pub u64);

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes ({:.3} KiB, {:.3} MiB, {:.3} GiB)",
            self.0,
            bytes_to_kib(self.0),
            bytes_to_mib(self.0),
            bytes_to_gib(self.0),
        )
    }
}

/// Displays a byte count in the largest unit it fills, from B up to GiB.
///
/// ```
/// use knotwork_core::HumanBytes;
///
/// assert_eq!(HumanBytes(512).to_string(), "512 B");
/// assert_eq!(HumanBytes(80_100).to_string(), "78.22 KiB");
/// assert_eq!(HumanBytes(3 * 1024 * 1024).to_string(), "3.00 MiB");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HumanBytes(pub u64);

impl fmt::Display for HumanBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if (bytes as f64) >= GIB_TO_B {
            write!(f, "{:.2} GiB", bytes_to_gib(bytes))
        } else if (bytes as f64) >= MIB_TO_B {
            write!(f, "{:.2} MiB", bytes_to_mib(bytes))
        } else if (bytes as f64) >= KIB_TO_B {
            write!(f, "{:.2} KiB", bytes_to_kib(bytes))
        } else {
            write!(f, "{bytes} B")
        }
    }
}
