//! Build the reference tables under a memory budget and print their reports.
//!
//! Logs at DEBUG so the allocator's ledger events are visible:
//!
//! ```text
//! cargo run -p knotwork-bench --example erf_table
//! ```

use knotwork_bench::{cos_profile, erf_profile, query_points, REFERENCE_POINTS};
use knotwork_ledger::{AllocatorConfig, BoundedAllocator, MemoryLimit, PolicyKind};
use knotwork_table::SampleTable;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== knotwork lookup tables ===\n");

    let config = AllocatorConfig::new()
        .with_limit(MemoryLimit::KiB(200.0))
        .with_policy(PolicyKind::Reject);
    config.validate()?;
    let alloc = BoundedAllocator::from_config(&config)?;

    let erf = erf_profile(&alloc, REFERENCE_POINTS)?;
    let cos = cos_profile(&alloc, REFERENCE_POINTS)?;
    println!("{}", erf.report());
    println!("{}", cos.report());

    println!("Sample reads:");
    for x in query_points(42, 5, 0.0, 7.0) {
        println!(
            "  erf({x:.6}) ~ {:.9}   (exact {:.9})",
            erf.read(x)?,
            libm::erf(x)
        );
    }
    println!("  cos(pi)     ~ {:.9}", cos.read(std::f64::consts::PI)?);
    println!();

    // A third 80 KB table does not fit the 200 KiB budget.
    match erf_profile(&alloc, REFERENCE_POINTS) {
        Ok(_) => println!("third table unexpectedly fit the budget"),
        Err(e) => println!("third table refused: {e}\n"),
    }

    print!("{}", alloc.ledger().report());
    println!("Over-limit requests: {}", alloc.ledger().breach_count());

    drop(erf);
    drop(cos);
    println!("\nAfter dropping both tables:");
    print!("{}", alloc.ledger().report());
    Ok(())
}
