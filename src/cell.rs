//! Full/empty-bit synchronization cells.
//!
//! A [`FebCell`] is a single machine-word slot tagged Empty or Full. It
//! signals data availability through the tag itself: producers block until
//! the cell is Empty, consumers block until it is Full, and the value and
//! tag always transition together as one atomic unit. This is dataflow
//! synchronization — there is no separate signaling object to manage.
//!
//! # Operations
//!
//! | op | blocks until | leaves cell |
//! |------|--------------|-------------|
//! | [`mark_empty`](FebCell::mark_empty) | never | Empty |
//! | [`mark_full`](FebCell::mark_full) | never | Full (bits kept) |
//! | [`write_f`](FebCell::write_f) | never | Full |
//! | [`write_ef`](FebCell::write_ef) | Empty | Full |
//! | [`read_ff`](FebCell::read_ff) | Full | Full |
//! | [`read_fe`](FebCell::read_fe) | Full | Empty |
//!
//! Exactly one producer completes a `write_ef` per Empty→Full edge, and
//! exactly one consumer completes a `read_fe` per Full→Empty edge. Any
//! number of `read_ff` callers may observe the same Full cell concurrently.
//!
//! # Blocking
//!
//! Blocking operations suspend the logical caller through the
//! [waiter-suspension contract](crate::park) and are unbounded: there are no
//! timeouts and no cancellation. The non-blocking `try_*` probes are the
//! only bounded surface. Ordering among waiters on one cell is unspecified
//! (not FIFO) but non-starving.
//!
//! # Example
//!
//! ```ignore
//! let cell = FebCell::new();          // starts Empty
//! cell.write_ef(42u64);               // immediate: cell was Empty
//! assert_eq!(cell.read_fe::<u64>(), 42); // leaves the cell Empty again
//! ```

use std::sync::Mutex as StdMutex;

use tracing::trace;

use crate::park::{Transition, WaitLot, WakeMode};
use crate::word::Word;

/// The two states of a cell tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FebState {
    /// No value is available; producers may proceed.
    Empty,
    /// A value is available; consumers may proceed.
    Full,
}

/// Error returned by [`FebCell::try_write_ef`] when the cell is Full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryWriteError;

impl std::fmt::Display for TryWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "feb cell is full; write would block")
    }
}

impl std::error::Error for TryWriteError {}

/// Error returned by the `try_read_*` probes when the cell is Empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryReadError;

impl std::fmt::Display for TryReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "feb cell is empty; read would block")
    }
}

impl std::error::Error for TryReadError {}

#[derive(Debug)]
struct Slot {
    bits: u64,
    full: bool,
}

/// A full/empty-bit synchronization cell over one machine word.
///
/// The stored word is untyped at rest; each operation is generic over a
/// [`Word`] type, so the width discipline is enforced entirely at compile
/// time. Reading at a different `Word` type than was written reinterprets
/// the bit pattern, exactly like the underlying word slot it models.
#[derive(Debug)]
pub struct FebCell {
    slot: StdMutex<Slot>,
    lot: WaitLot,
}

impl Default for FebCell {
    fn default() -> Self {
        Self::new()
    }
}

impl FebCell {
    /// Creates a cell in the Empty state with a zero word.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: StdMutex::new(Slot {
                bits: 0,
                full: false,
            }),
            lot: WaitLot::new(),
        }
    }

    /// Creates a cell already Full with `value`.
    #[must_use]
    pub fn full<T: Word>(value: T) -> Self {
        Self {
            slot: StdMutex::new(Slot {
                bits: value.to_bits(),
                full: true,
            }),
            lot: WaitLot::new(),
        }
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().expect("feb cell lock poisoned")
    }

    /// Returns the current tag. A probe only: the state may change the
    /// moment the call returns.
    #[must_use]
    pub fn status(&self) -> FebState {
        if self.lock_slot().full {
            FebState::Full
        } else {
            FebState::Empty
        }
    }

    /// Unconditionally sets the cell Empty, discarding any pending value.
    ///
    /// Never blocks. This is an initialization/reset primitive, not part of
    /// the producer/consumer handshake. One pending producer is admitted.
    pub fn mark_empty(&self) {
        {
            let mut slot = self.lock_slot();
            slot.bits = 0;
            slot.full = false;
        }
        self.lot.wake(Transition::BecameEmpty, WakeMode::One);
    }

    /// Unconditionally sets the cell Full, keeping the current word.
    ///
    /// Never blocks. Seeds availability without writing a value; waiting
    /// consumers are all woken.
    pub fn mark_full(&self) {
        {
            let mut slot = self.lock_slot();
            slot.full = true;
        }
        self.lot.wake(Transition::BecameFull, WakeMode::All);
    }

    /// Unconditionally writes `value` and sets the cell Full.
    ///
    /// The "producer always wins" initialization primitive: never blocks
    /// regardless of the current state, overwriting any pending value.
    pub fn write_f<T: Word>(&self, value: T) {
        {
            let mut slot = self.lock_slot();
            slot.bits = value.to_bits();
            slot.full = true;
        }
        self.lot.wake(Transition::BecameFull, WakeMode::All);
    }

    /// Blocks until the cell is Empty, then writes `value` and sets Full.
    ///
    /// Exactly one producer completes per Empty→Full edge; if the cell is
    /// already Full, the caller waits for a consumer to empty it. All
    /// waiting consumers are woken by the transition.
    pub fn write_ef<T: Word>(&self, value: T) {
        let mut slot = self.lock_slot();
        while slot.full {
            trace!("write_ef waiting for empty");
            slot = self.lot.suspend(slot, Transition::BecameEmpty);
        }
        slot.bits = value.to_bits();
        slot.full = true;
        drop(slot);
        self.lot.wake(Transition::BecameFull, WakeMode::All);
    }

    /// Writes `value` and sets Full only if the cell is currently Empty.
    ///
    /// # Errors
    /// Returns [`TryWriteError`] if the cell is Full.
    pub fn try_write_ef<T: Word>(&self, value: T) -> Result<(), TryWriteError> {
        {
            let mut slot = self.lock_slot();
            if slot.full {
                return Err(TryWriteError);
            }
            slot.bits = value.to_bits();
            slot.full = true;
        }
        self.lot.wake(Transition::BecameFull, WakeMode::All);
        Ok(())
    }

    /// Blocks until the cell is Full, then copies the value out, leaving
    /// the cell Full.
    ///
    /// Non-destructive: any number of concurrent callers observe the same
    /// value.
    pub fn read_ff<T: Word>(&self) -> T {
        let mut slot = self.lock_slot();
        while !slot.full {
            trace!("read_ff waiting for full");
            slot = self.lot.suspend(slot, Transition::BecameFull);
        }
        T::from_bits(slot.bits)
    }

    /// Copies the value out if the cell is Full, leaving it Full.
    ///
    /// # Errors
    /// Returns [`TryReadError`] if the cell is Empty.
    pub fn try_read_ff<T: Word>(&self) -> Result<T, TryReadError> {
        let slot = self.lock_slot();
        if slot.full {
            Ok(T::from_bits(slot.bits))
        } else {
            Err(TryReadError)
        }
    }

    /// Blocks until the cell is Full, then copies the value out and sets
    /// the cell Empty.
    ///
    /// Destructive single-consumer read: a second `read_fe` waits for a
    /// fresh producer. One pending producer is admitted by the transition.
    pub fn read_fe<T: Word>(&self) -> T {
        let mut slot = self.lock_slot();
        while !slot.full {
            trace!("read_fe waiting for full");
            slot = self.lot.suspend(slot, Transition::BecameFull);
        }
        let value = T::from_bits(slot.bits);
        slot.full = false;
        drop(slot);
        self.lot.wake(Transition::BecameEmpty, WakeMode::One);
        value
    }

    /// Copies the value out and empties the cell if it is Full.
    ///
    /// # Errors
    /// Returns [`TryReadError`] if the cell is Empty.
    pub fn try_read_fe<T: Word>(&self) -> Result<T, TryReadError> {
        let value = {
            let mut slot = self.lock_slot();
            if !slot.full {
                return Err(TryReadError);
            }
            slot.full = false;
            T::from_bits(slot.bits)
        };
        self.lot.wake(Transition::BecameEmpty, WakeMode::One);
        Ok(value)
    }
}

/// Sentinel word stored in an unlocked [`FebMutex`] cell.
const UNLOCKED: u64 = 1;

/// A binary mutex built from a cell's Empty/Full tag.
///
/// Full means available; acquiring performs a destructive read, flipping
/// the cell Empty (= held). Releasing refills the cell. Because only the
/// holder releases, the release never blocks in practice.
///
/// The guard releases on drop. There is no poisoning: a panic while holding
/// the guard refills the cell during unwinding.
#[derive(Debug)]
pub struct FebMutex {
    cell: FebCell,
}

impl Default for FebMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl FebMutex {
    /// Creates an unlocked mutex (cell starts Full).
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: FebCell::full(UNLOCKED),
        }
    }

    /// Acquires the lock, blocking until it is available.
    pub fn lock(&self) -> FebMutexGuard<'_> {
        let _token: u64 = self.cell.read_fe();
        FebMutexGuard { lock: self }
    }

    /// Acquires the lock if it is immediately available.
    ///
    /// # Errors
    /// Returns [`TryReadError`] if the lock is held.
    pub fn try_lock(&self) -> Result<FebMutexGuard<'_>, TryReadError> {
        let _token: u64 = self.cell.try_read_fe()?;
        Ok(FebMutexGuard { lock: self })
    }

    /// Returns true if the lock is currently held by someone.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.cell.status() == FebState::Empty
    }
}

/// RAII guard for [`FebMutex`]; releases the lock on drop.
#[derive(Debug)]
#[must_use = "the lock releases immediately if the guard is dropped"]
pub struct FebMutexGuard<'a> {
    lock: &'a FebMutex,
}

impl Drop for FebMutexGuard<'_> {
    fn drop(&mut self) {
        self.lock.cell.write_ef(UNLOCKED);
    }
}
