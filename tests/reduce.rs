//! End-to-end reductions through the fork/FEB client contract.

use filament::test_utils::init_test_logging;
use filament::{reduce, ReduceOp, Runtime};

#[test]
fn multi_chunk_sum_matches_sequential_fold() {
    init_test_logging();
    filament::test_phase!("multi_chunk_sum_matches_sequential_fold");

    // 25_000 elements spans three chunks at the default chunk size.
    let rt = Runtime::new();
    let data: Vec<u64> = (1..=25_000).collect();
    let expected: u64 = data.iter().sum();
    assert_eq!(reduce(&rt, ReduceOp::Sum, &data), Some(expected));
}

#[test]
fn multi_chunk_extrema_and_product() {
    init_test_logging();
    filament::test_phase!("multi_chunk_extrema_and_product");

    let rt = Runtime::new();
    let data: Vec<i64> = (0..30_000).map(|i| (i * 31 + 7) % 10_007 - 5_000).collect();
    let max = data.iter().copied().max();
    let min = data.iter().copied().min();
    assert_eq!(reduce(&rt, ReduceOp::Max, &data), max);
    assert_eq!(reduce(&rt, ReduceOp::Min, &data), min);

    // Product over mostly-ones stays in range while still crossing chunks.
    let mut ones = vec![1u64; 22_000];
    ones[100] = 3;
    ones[15_000] = 5;
    ones[21_999] = 7;
    assert_eq!(reduce(&rt, ReduceOp::Product, &ones), Some(105));
}

#[test]
fn float_extrema_across_chunks() {
    init_test_logging();
    filament::test_phase!("float_extrema_across_chunks");

    let rt = Runtime::new();
    let data: Vec<f64> = (0..20_001).map(|i| f64::from(i - 10_000) / 8.0).collect();
    assert_eq!(reduce(&rt, ReduceOp::Max, &data), Some(1250.0));
    assert_eq!(reduce(&rt, ReduceOp::Min, &data), Some(-1250.0));
}
