//! The waiter-suspension contract between FEB cells and their host.
//!
//! Every blocking cell operation suspends the *logical* caller until the
//! cell undergoes a particular state transition. The cell needs exactly two
//! things from whatever hosts it: "suspend me until this cell takes this
//! transition" and "wake the waiters parked on this transition". Nothing
//! else — no placement, no priorities, no topology.
//!
//! `WaitLot` is the realization of that contract for OS-thread hosts: one
//! condition variable per transition, with the cell's own mutex as the
//! predicate lock. A cooperative runtime embedding these cells would park
//! task continuations instead of threads, but would present the same two
//! operations.
//!
//! # Wake policy
//!
//! - A cell becoming **Full** may satisfy any number of non-destructive
//!   readers, so Full-directed waiters are woken with [`WakeMode::All`].
//!   Destructive readers mixed into the same crowd re-check the state under
//!   the lock and at most one of them consumes.
//! - A cell becoming **Empty** admits exactly one producer onto the next
//!   Empty→Full edge, so Empty-directed waiters are woken with
//!   [`WakeMode::One`].
//!
//! # Ordering
//!
//! Ordering among waiters parked on the same cell is unspecified. It is not
//! FIFO and must not be relied on; the only guarantee is that a waiter whose
//! transition keeps occurring is eventually admitted.

use std::sync::{Condvar, MutexGuard};

/// The state edge a suspended caller is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The cell transitioned Empty → Full.
    BecameFull,
    /// The cell transitioned Full → Empty.
    BecameEmpty,
}

/// How many waiters to admit when a transition fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeMode {
    /// Wake a single waiter (one producer per Empty→Full edge).
    One,
    /// Wake every waiter (broadcast on Full).
    All,
}

/// Per-cell parking lot: one condvar per transition direction.
#[derive(Debug, Default)]
pub(crate) struct WaitLot {
    became_full: Condvar,
    became_empty: Condvar,
}

impl WaitLot {
    pub(crate) const fn new() -> Self {
        Self {
            became_full: Condvar::new(),
            became_empty: Condvar::new(),
        }
    }

    fn lane(&self, transition: Transition) -> &Condvar {
        match transition {
            Transition::BecameFull => &self.became_full,
            Transition::BecameEmpty => &self.became_empty,
        }
    }

    /// Suspends the caller for one wait step, releasing `guard` while
    /// parked. Spurious wakeups are possible; callers re-check their
    /// predicate in a loop around this call.
    pub(crate) fn suspend<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        transition: Transition,
    ) -> MutexGuard<'a, T> {
        self.lane(transition)
            .wait(guard)
            .expect("feb cell lock poisoned")
    }

    /// Wakes waiters parked on `transition`.
    pub(crate) fn wake(&self, transition: Transition, mode: WakeMode) {
        let lane = self.lane(transition);
        match mode {
            WakeMode::One => lane.notify_one(),
            WakeMode::All => lane.notify_all(),
        }
    }
}
