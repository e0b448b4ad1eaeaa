//! Atomic increment-by-amount, specialized on width and numeric domain.
//!
//! Integer targets map straight onto the hardware `fetch_add` at their own
//! width (32 or 64 bits). Floating-point targets have no bitwise atomic add,
//! so they use a value-preserving read-modify-write loop over the bit
//! representation instead. Both axes of the dispatch are decided by the
//! type system: there is nothing to check at runtime, and non-numeric types
//! simply have no impl.

use std::sync::atomic::{AtomicI32, AtomicI64, AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// A numeric type supporting atomic increment-by-amount.
///
/// `fetch_incr` returns the value observed *before* the increment, matching
/// the hardware fetch-and-add convention.
pub trait AtomicIncrement: Copy {
    /// Backing atomic storage for this numeric type.
    type Storage: Send + Sync;

    /// Creates storage holding `initial`.
    fn storage(initial: Self) -> Self::Storage;

    /// Atomically adds `amount`, returning the previous value.
    fn fetch_incr(storage: &Self::Storage, amount: Self) -> Self;

    /// Reads the current value.
    fn load(storage: &Self::Storage) -> Self;
}

macro_rules! impl_atomic_increment_int {
    ($($t:ty => $atomic:ty),* $(,)?) => {
        $(
            impl AtomicIncrement for $t {
                type Storage = $atomic;

                fn storage(initial: Self) -> Self::Storage {
                    <$atomic>::new(initial)
                }

                fn fetch_incr(storage: &Self::Storage, amount: Self) -> Self {
                    storage.fetch_add(amount, Ordering::AcqRel)
                }

                fn load(storage: &Self::Storage) -> Self {
                    storage.load(Ordering::Acquire)
                }
            }
        )*
    };
}

impl_atomic_increment_int! {
    u32 => AtomicU32,
    i32 => AtomicI32,
    u64 => AtomicU64,
    i64 => AtomicI64,
    usize => AtomicUsize,
}

macro_rules! impl_atomic_increment_float {
    ($($t:ty => $atomic:ty),* $(,)?) => {
        $(
            impl AtomicIncrement for $t {
                type Storage = $atomic;

                fn storage(initial: Self) -> Self::Storage {
                    <$atomic>::new(initial.to_bits())
                }

                fn fetch_incr(storage: &Self::Storage, amount: Self) -> Self {
                    let mut current = storage.load(Ordering::Acquire);
                    loop {
                        let observed = <$t>::from_bits(current);
                        let next = (observed + amount).to_bits();
                        match storage.compare_exchange_weak(
                            current,
                            next,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        ) {
                            Ok(_) => return observed,
                            Err(actual) => current = actual,
                        }
                    }
                }

                fn load(storage: &Self::Storage) -> Self {
                    <$t>::from_bits(storage.load(Ordering::Acquire))
                }
            }
        )*
    };
}

impl_atomic_increment_float! {
    f32 => AtomicU32,
    f64 => AtomicU64,
}

/// A shared counter over any [`AtomicIncrement`] type.
#[derive(Debug)]
pub struct IncrCell<T: AtomicIncrement> {
    storage: T::Storage,
}

impl<T: AtomicIncrement + Default> Default for IncrCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: AtomicIncrement> IncrCell<T> {
    /// Creates a counter holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            storage: T::storage(initial),
        }
    }

    /// Atomically adds `amount`, returning the previous value.
    pub fn incr(&self, amount: T) -> T {
        T::fetch_incr(&self.storage, amount)
    }

    /// Reads the current value.
    #[must_use]
    pub fn get(&self) -> T {
        T::load(&self.storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use std::sync::Arc;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn integer_increment_returns_previous() {
        init_test("integer_increment_returns_previous");
        let cell = IncrCell::new(10u64);
        assert_eq!(cell.incr(5), 10);
        assert_eq!(cell.get(), 15);

        let signed = IncrCell::new(-3i32);
        assert_eq!(signed.incr(3), -3);
        assert_eq!(signed.get(), 0);
    }

    #[test]
    fn float_increment_returns_previous() {
        init_test("float_increment_returns_previous");
        let cell = IncrCell::new(1.5f64);
        assert_eq!(cell.incr(0.25), 1.5);
        assert_eq!(cell.get(), 1.75);
    }

    #[test]
    fn concurrent_integer_increments_lose_nothing() {
        init_test("concurrent_integer_increments_lose_nothing");
        const THREADS: usize = 8;
        const ROUNDS: u64 = 10_000;
        let cell = Arc::new(IncrCell::new(0u64));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    for _ in 0..ROUNDS {
                        cell.incr(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }
        assert_eq!(cell.get(), THREADS as u64 * ROUNDS);
    }

    #[test]
    fn concurrent_float_increments_lose_nothing() {
        init_test("concurrent_float_increments_lose_nothing");
        const THREADS: usize = 4;
        const ROUNDS: usize = 10_000;
        // 1.0 sums exactly in f64 well past these magnitudes.
        let cell = Arc::new(IncrCell::new(0.0f64));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    for _ in 0..ROUNDS {
                        cell.incr(1.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }
        assert_eq!(cell.get(), (THREADS * ROUNDS) as f64);
    }
}
