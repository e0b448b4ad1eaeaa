//! Parallel reductions over the fork/FEB client contract.
//!
//! The classic client of the substrate: split the input into chunks, fork
//! one task per chunk, and have each task perform exactly one
//! [`write_ef`](crate::cell::FebCell::write_ef) into its own private result
//! cell. The parent joins by a destructive read on each cell in chunk order
//! and folds the partials. No other synchronization is involved.
//!
//! One generic reduction replaces the per-type, per-operation function
//! family of the classic formulation: the combining operation is a
//! [`ReduceOp`] value applied uniformly over any [`Reducible`] element type.
//!
//! Floating-point results depend on association order. The order here is
//! deterministic for a given input length and chunk size (in-chunk
//! left-to-right, then chunk-sequential), but differs from a plain
//! sequential fold when more than one chunk is used.

use std::sync::Arc;

use tracing::debug;

use crate::cell::FebCell;
use crate::config;
use crate::rt::Runtime;
use crate::word::Word;

/// Associative combining operation for a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Addition.
    Sum,
    /// Multiplication.
    Product,
    /// Larger of the two operands.
    Max,
    /// Smaller of the two operands.
    Min,
}

/// Element types a reduction can combine.
///
/// Bounded by [`Word`] because every partial result travels through a FEB
/// cell.
pub trait Reducible: Word {
    /// Applies `op` to two operands.
    #[must_use]
    fn combine(self, other: Self, op: ReduceOp) -> Self;
}

macro_rules! impl_reducible {
    ($($t:ty),*) => {
        $(
            impl Reducible for $t {
                fn combine(self, other: Self, op: ReduceOp) -> Self {
                    match op {
                        ReduceOp::Sum => self + other,
                        ReduceOp::Product => self * other,
                        ReduceOp::Max => if self < other { other } else { self },
                        ReduceOp::Min => if self > other { other } else { self },
                    }
                }
            }
        )*
    };
}

impl_reducible!(u64, i64, f64);

fn fold_slice<T: Reducible>(op: ReduceOp, slice: &[T]) -> T {
    let mut acc = slice[0];
    for &item in &slice[1..] {
        acc = acc.combine(item, op);
    }
    acc
}

/// Reduces `data` with `op`, forking one task per chunk.
///
/// Returns `None` for empty input. Inputs of at most one chunk fold inline
/// without forking. The chunk size defaults to
/// [`DEFAULT_REDUCE_CHUNK`](config::DEFAULT_REDUCE_CHUNK) and can be
/// overridden through [`ENV_REDUCE_CHUNK`](config::ENV_REDUCE_CHUNK); an
/// invalid override falls back to the default.
pub fn reduce<T>(rt: &Runtime, op: ReduceOp, data: &[T]) -> Option<T>
where
    T: Reducible,
{
    if data.is_empty() {
        return None;
    }
    let chunk = config::reduce_chunk_size().unwrap_or(config::DEFAULT_REDUCE_CHUNK);
    if data.len() <= chunk {
        return Some(fold_slice(op, data));
    }

    let chunks: Vec<Vec<T>> = data.chunks(chunk).map(<[T]>::to_vec).collect();
    debug!(len = data.len(), chunk, tasks = chunks.len(), "forking reduction");

    let mut results = Vec::with_capacity(chunks.len());
    let mut handles = Vec::with_capacity(chunks.len());
    for piece in chunks {
        let result = Arc::new(FebCell::new());
        results.push(Arc::clone(&result));
        handles.push(rt.fork(move || {
            result.write_ef(fold_slice(op, &piece));
        }));
    }

    let mut acc: Option<T> = None;
    for result in &results {
        let partial: T = result.read_fe();
        acc = Some(match acc {
            Some(current) => current.combine(partial, op),
            None => partial,
        });
    }
    for handle in handles {
        handle.join();
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_REDUCE_CHUNK;
    use crate::test_utils::{env_lock, init_test_logging};

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn empty_input_reduces_to_none() {
        init_test("empty_input_reduces_to_none");
        let rt = Runtime::new();
        assert_eq!(reduce::<u64>(&rt, ReduceOp::Sum, &[]), None);
    }

    #[test]
    fn inline_fold_matches_sequential() {
        init_test("inline_fold_matches_sequential");
        let rt = Runtime::new();
        let data: Vec<u64> = (1..=100).collect();
        assert_eq!(reduce(&rt, ReduceOp::Sum, &data), Some(5050));
        assert_eq!(reduce(&rt, ReduceOp::Max, &data), Some(100));
        assert_eq!(reduce(&rt, ReduceOp::Min, &data), Some(1));
        assert_eq!(
            reduce(&rt, ReduceOp::Product, &[2u64, 3, 5, 7]),
            Some(210)
        );
    }

    #[test]
    fn forked_reduction_spans_chunk_boundaries() {
        init_test("forked_reduction_spans_chunk_boundaries");
        let _guard = env_lock();
        std::env::set_var(ENV_REDUCE_CHUNK, "64");

        let rt = Runtime::new();
        let data: Vec<i64> = (-500..=500).collect();
        assert_eq!(reduce(&rt, ReduceOp::Sum, &data), Some(0));
        assert_eq!(reduce(&rt, ReduceOp::Min, &data), Some(-500));
        assert_eq!(reduce(&rt, ReduceOp::Max, &data), Some(500));

        // Integer sums are association-independent; float sums of exactly
        // representable values are too.
        let floats: Vec<f64> = (0..1000).map(f64::from).collect();
        assert_eq!(reduce(&rt, ReduceOp::Sum, &floats), Some(499_500.0));

        std::env::remove_var(ENV_REDUCE_CHUNK);
    }
}
