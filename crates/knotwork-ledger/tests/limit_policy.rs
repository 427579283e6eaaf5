//! Integration test: over-limit policy dispatch through the bounded allocator.
//!
//! A 1-byte ceiling with a 1 KiB request must reach the policy exactly once,
//! and the ledger must end up in the state the decision implies.

use std::io::Cursor;

use knotwork_core::AllocError;
use knotwork_ledger::{
    AllocatorConfig, BoundedAllocator, ConfirmPolicy, LimitDecision, LimitStatus, MemoryLimit,
    PolicyKind,
};
use knotwork_test_utils::{capped_allocator, recording_allocator, RecordingPolicy};

// ── Policy invocation ────────────────────────────────────────────────

#[test]
fn one_byte_ceiling_invokes_policy_once_and_rejects() {
    let policy = RecordingPolicy::new(LimitDecision::Reject);
    let alloc = recording_allocator(1, &policy);

    let err = alloc.allocate_zeroed::<u8>(1024, "kib").unwrap_err();

    assert_eq!(policy.calls(), 1);
    assert_eq!(
        err,
        AllocError::LimitRejected {
            label: "kib".into(),
            requested: 1024,
            current: 0,
            limit: 1,
        }
    );
    assert_eq!(alloc.ledger().current_bytes(), 0);
    assert_eq!(alloc.ledger().breach_count(), 1);
}

#[test]
fn one_byte_ceiling_invokes_policy_once_and_proceeds() {
    let policy = RecordingPolicy::new(LimitDecision::Proceed);
    let alloc = recording_allocator(1, &policy);

    let buf = alloc.allocate_zeroed::<u8>(1024, "kib").unwrap();

    assert_eq!(policy.calls(), 1);
    let breach = policy.last_breach().unwrap();
    assert_eq!(breach.label, "kib");
    assert_eq!(breach.requested, 1024);
    assert_eq!(breach.projected(), 1024);
    assert_eq!(buf.len(), 1024);
    assert_eq!(alloc.ledger().current_bytes(), 1024);
    assert_eq!(alloc.ledger().verify_limit(), LimitStatus::Over);

    drop(buf);
    assert_eq!(alloc.ledger().current_bytes(), 0);
    assert_eq!(alloc.ledger().verify_limit(), LimitStatus::Under);
}

#[test]
fn each_breaching_request_is_a_separate_decision() {
    let policy = RecordingPolicy::new(LimitDecision::Proceed);
    let alloc = recording_allocator(100, &policy);

    let _a = alloc.allocate_zeroed::<u8>(60, "a").unwrap();
    let _b = alloc.allocate_zeroed::<u8>(60, "b").unwrap();
    let _c = alloc.allocate_zeroed::<u8>(60, "c").unwrap();

    let breaches = policy.breaches();
    assert_eq!(breaches.len(), 2);
    assert_eq!(breaches[0].current, 60);
    assert_eq!(breaches[1].current, 120);
}

#[test]
fn reaching_ceiling_exactly_counts_as_breach() {
    let policy = RecordingPolicy::new(LimitDecision::Reject);
    let alloc = recording_allocator(64, &policy);
    let _first = alloc.allocate_zeroed::<u8>(32, "below").unwrap();
    assert_eq!(policy.calls(), 0);
    assert!(alloc.allocate_zeroed::<u8>(32, "at").is_err());
    assert_eq!(policy.calls(), 1);
}

// ── Accounting ───────────────────────────────────────────────────────

#[test]
fn ledger_breaks_usage_down_by_label() {
    let alloc = capped_allocator(1 << 20);
    let a = alloc.allocate_zeroed::<f64>(100, "erf").unwrap();
    let b = alloc.allocate_zeroed::<f32>(100, "cos").unwrap();
    let c = alloc.allocate_zeroed::<f64>(50, "erf").unwrap();

    assert_eq!(
        alloc.ledger().usage_by_label(),
        vec![("erf".to_string(), 1200), ("cos".to_string(), 400)]
    );
    let report = alloc.ledger().report().to_string();
    assert!(report.contains("Memory allocated:       1600 bytes"));
    assert!(report.contains("erf"));

    drop(a);
    drop(c);
    assert_eq!(alloc.ledger().usage_by_label(), vec![("cos".to_string(), 400)]);
    drop(b);
    assert_eq!(alloc.ledger().current_bytes(), 0);
    assert!(alloc.ledger().usage_by_label().is_empty());
}

#[test]
fn unlimited_ledger_never_breaches() {
    let policy = RecordingPolicy::new(LimitDecision::Reject);
    let alloc = recording_allocator(1, &policy);
    alloc.ledger().clear_limit();
    let _big = alloc.allocate_zeroed::<u64>(1 << 16, "big").unwrap();
    assert_eq!(policy.calls(), 0);
    assert!(alloc
        .ledger()
        .report()
        .to_string()
        .contains("Maximum memory allowed: unlimited"));
}

// ── Configuration ────────────────────────────────────────────────────

#[test]
fn configured_allocator_enforces_limit() {
    let config = AllocatorConfig::new()
        .with_limit(MemoryLimit::KiB(1.0))
        .with_policy(PolicyKind::Reject);
    config.validate().unwrap();
    let alloc = BoundedAllocator::from_config(&config).unwrap();

    assert_eq!(alloc.ledger().max_bytes(), 1024);
    assert!(alloc.allocate_zeroed::<u8>(1000, "ok").is_ok());
    assert!(matches!(
        alloc.allocate_zeroed::<u8>(1024, "too big"),
        Err(AllocError::LimitRejected { .. })
    ));
}

#[test]
fn invalid_configured_limit_is_refused() {
    let config = AllocatorConfig::new().with_limit(MemoryLimit::MiB(-1.0));
    assert!(config.validate().is_err());
    assert!(BoundedAllocator::from_config(&config).is_err());
}

#[test]
fn confirming_prompt_lets_allocation_through() {
    let alloc = BoundedAllocator::new(Box::new(ConfirmPolicy::new(
        Cursor::new("y\n"),
        Vec::new(),
    )));
    alloc.ledger().set_max_bytes(1);
    let buf = alloc.allocate_zeroed::<u8>(1024, "confirmed").unwrap();
    assert_eq!(buf.len(), 1024);
}
