//! Benchmark profiles and utilities for knotwork.
//!
//! - [`erf_profile`] / [`cos_profile`]: the reference tables, built through
//!   a caller-supplied allocator
//! - [`query_points`]: deterministic query points via a seeded ChaCha RNG

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use knotwork_core::TableError;
use knotwork_ledger::SharedAllocator;
use knotwork_table::LookupTable;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Knot count used by the reference profiles.
pub const REFERENCE_POINTS: usize = 10_000;

/// Build the reference `erf` table: `[0, 7]` with `n` knots.
pub fn erf_profile(allocator: &SharedAllocator, n: usize) -> Result<LookupTable<f64>, TableError> {
    LookupTable::sampled(allocator, "erf()", 0.0, 7.0, n, libm::erf)
}

/// Build the reference `cos` table: `[0, 2π]` with `n` knots.
pub fn cos_profile(allocator: &SharedAllocator, n: usize) -> Result<LookupTable<f64>, TableError> {
    LookupTable::sampled(allocator, "cos()", 0.0, std::f64::consts::TAU, n, f64::cos)
}

/// `count` uniformly distributed points in `[min, max)`, reproducible per seed.
pub fn query_points(seed: u64, count: usize, min: f64, max: f64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| rng.random_range(min..max)).collect()
}
