//! Runtime context: task forking, participant identity, and the
//! process-wide barrier lifecycle.
//!
//! [`Runtime`] is the explicit context object collective call sites share.
//! It owns at most one [`Barrier`] at a time — the lazily-initialized
//! "global" barrier — and hands out participant identities at
//! [`fork`](Runtime::fork) time, playing the role a worker/shepherd id plays
//! in a full scheduler. Identity assignment is fork-ordered: the first task
//! forked from a context is participant 0, the next 1, and so on, so a
//! caller that initializes the barrier for N participants and then forks
//! exactly N tasks gets a correctly indexed collective.
//!
//! # Lifecycle rules
//!
//! - [`global_barrier_init`](Runtime::global_barrier_init) is idempotent: a
//!   second init while a barrier exists is a no-op.
//! - [`global_barrier_destroy`](Runtime::global_barrier_destroy) on an
//!   absent barrier is a no-op.
//! - [`global_barrier_resize`](Runtime::global_barrier_resize) is
//!   destroy-then-recreate, never in place.
//! - The caller must ensure no participant is inside
//!   [`global_enter`](Runtime::global_enter) across a destroy or resize;
//!   that interleaving is not internally synchronized.

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tracing::debug;

use crate::barrier::{Barrier, BarrierKind};

thread_local! {
    static PARTICIPANT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Handle to a forked task; joining yields the task's result.
#[derive(Debug)]
pub struct TaskHandle<T> {
    participant: usize,
    inner: std::thread::JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    /// Participant identity assigned to the task at fork.
    #[must_use]
    pub fn participant(&self) -> usize {
        self.participant
    }

    /// Waits for the task and returns its result.
    ///
    /// # Panics
    /// Propagates a panic from the forked task.
    pub fn join(self) -> T {
        self.inner.join().expect("forked task panicked")
    }
}

/// Explicit runtime context for collective operations.
#[derive(Debug, Default)]
pub struct Runtime {
    global: StdMutex<Option<Arc<Barrier>>>,
    next_participant: AtomicUsize,
}

impl Runtime {
    /// Creates a context with no global barrier and participant ids
    /// starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forks a logical task, assigning it the next participant identity.
    pub fn fork<F, T>(&self, f: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let participant = self.next_participant.fetch_add(1, Ordering::Relaxed);
        let inner = std::thread::spawn(move || {
            PARTICIPANT.with(|slot| slot.set(Some(participant)));
            f()
        });
        TaskHandle { participant, inner }
    }

    /// Identity of the calling task, if it was forked from a context.
    #[must_use]
    pub fn current_participant() -> Option<usize> {
        PARTICIPANT.with(Cell::get)
    }

    /// Lazily creates the global barrier. No-op when one already exists,
    /// even with a different size; use
    /// [`global_barrier_resize`](Self::global_barrier_resize) to change it.
    pub fn global_barrier_init(&self, participants: usize, debug: bool) {
        let mut slot = self.lock_global();
        if slot.is_none() {
            *slot = Some(Arc::new(Barrier::new(
                participants,
                BarrierKind::FixedRegion,
                debug,
            )));
            debug!(participants, "global barrier initialized");
        }
    }

    /// Tears down the global barrier; no-op when absent.
    pub fn global_barrier_destroy(&self) {
        if self.lock_global().take().is_some() {
            debug!("global barrier destroyed");
        }
    }

    /// Replaces the global barrier with a fresh one of `participants`.
    ///
    /// Destroy-then-recreate; the caller must ensure no participant is
    /// concurrently inside an enter call.
    pub fn global_barrier_resize(&self, participants: usize) {
        let mut slot = self.lock_global();
        // The debug flag survives a resize, like recreating by hand with
        // the same arguments.
        let debug = slot.as_ref().is_some_and(|b| b.debug_enabled());
        *slot = Some(Arc::new(Barrier::new(
            participants,
            BarrierKind::FixedRegion,
            debug,
        )));
        debug!(participants, "global barrier resized");
    }

    /// Current global barrier, if initialized.
    #[must_use]
    pub fn global_barrier(&self) -> Option<Arc<Barrier>> {
        self.lock_global().clone()
    }

    /// Enters the global barrier as the calling task.
    ///
    /// # Panics
    /// Panics if the caller was not forked from a context or if no global
    /// barrier has been initialized — both caller programming errors.
    pub fn global_enter(&self) {
        let participant =
            Self::current_participant().expect("global_enter called outside a forked task");
        let barrier = self
            .global_barrier()
            .expect("global barrier not initialized");
        barrier.enter(participant);
    }

    fn lock_global(&self) -> std::sync::MutexGuard<'_, Option<Arc<Barrier>>> {
        self.global.lock().expect("global barrier slot poisoned")
    }
}
