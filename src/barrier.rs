//! Logarithmic self-cleaning tree barrier over FEB cells.
//!
//! N participants synchronize through two arrays of [`FebCell`]s arranged as
//! a binary fan-in/fan-out tree. At each level a participant is paired with
//! the peer whose index differs in that level's bit; the numerically lower
//! index consumes the partner's arrival signal and climbs, the higher index
//! signals its own up-slot and parks on its down-slot. Whoever completes a
//! subtree's arrival releases that subtree on the way out. Each participant
//! therefore performs O(log N) signaling steps.
//!
//! The barrier is **self-cleaning**: every up-slot and every down-slot is
//! produced exactly once and consumed exactly once per cycle, so all slots
//! are Empty again by the time the last participant returns and the same
//! barrier is immediately reusable with no reset step.
//!
//! # Caller obligations
//!
//! - Every participant index in `0..participants` must eventually call
//!   [`enter`](Barrier::enter) each cycle; a missing participant deadlocks
//!   the rest. That is the expected fate of a barrier, not an error.
//! - Dropping or replacing the barrier while any participant is inside
//!   `enter` is undefined behavior by design and is not defended against.

use std::fmt::Write as _;

use tracing::{debug, trace};

use crate::cell::{FebCell, FebState};

/// Word written into up/down slots; carries no information, only the Full tag.
const SIGNAL: u64 = 1;

/// Barrier construction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierKind {
    /// Fixed participant count, known at construction. The only implemented
    /// kind.
    FixedRegion,
    /// Dynamically sized barrier. Recognized but unimplemented; requesting
    /// it aborts.
    Variable,
}

/// Which slot array a [`Barrier::dump`] renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpScope {
    /// Up-slots (arrival signals) only.
    Up,
    /// Down-slots (release signals) only.
    Down,
    /// Both arrays.
    Both,
}

/// A logarithmic tree barrier for a fixed set of participants.
#[derive(Debug)]
pub struct Barrier {
    participants: usize,
    depth: u32,
    up: Box<[FebCell]>,
    down: Box<[FebCell]>,
    debug: bool,
}

impl Barrier {
    /// Creates a barrier for `participants` callers.
    ///
    /// `participants == 0` yields a valid but unallocated barrier whose
    /// `enter` is never legal to call and whose drop is a no-op.
    ///
    /// # Panics
    /// Panics if `kind` is [`BarrierKind::Variable`]: requesting the
    /// unimplemented kind is a programming error, not a runtime condition.
    #[must_use]
    pub fn new(participants: usize, kind: BarrierKind, debug: bool) -> Self {
        assert!(
            kind == BarrierKind::FixedRegion,
            "variable-size barrier kind is not implemented"
        );
        let debug = crate::config::barrier_debug_override().unwrap_or(debug);

        if participants == 0 {
            return Self {
                participants,
                depth: 0,
                up: Box::new([]),
                down: Box::new([]),
                debug,
            };
        }

        // Tree depth: halve (participants - 1) until zero, at least one
        // level. Equals ceil(log2(participants)) for participants > 1.
        let mut depth = 1u32;
        let mut temp = (participants - 1) >> 1;
        while temp != 0 {
            temp >>= 1;
            depth += 1;
        }
        let allocated = 2usize << depth;

        let up: Box<[FebCell]> = (0..allocated).map(|_| FebCell::new()).collect();
        let down: Box<[FebCell]> = (0..allocated).map(|_| FebCell::new()).collect();

        debug!(participants, depth, allocated, "barrier created");
        Self {
            participants,
            depth,
            up,
            down,
            debug,
        }
    }

    /// Number of participants this barrier synchronizes.
    #[must_use]
    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Height of the signaling tree.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Length of each slot array (one doubling of headroom beyond the
    /// minimal tree); zero for an unallocated barrier.
    #[must_use]
    pub fn allocated_slots(&self) -> usize {
        self.up.len()
    }

    /// Whether per-step debug tracing is enabled.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// Enters the barrier as participant `me`, returning once every
    /// participant of the current cycle has entered.
    ///
    /// Degenerate fast path: with one participant (or fewer) this returns
    /// immediately without touching any slot.
    ///
    /// # Panics
    /// Panics if `me >= participants` on a multi-participant barrier.
    pub fn enter(&self, me: usize) {
        if self.participants <= 1 {
            return;
        }
        assert!(
            me < self.participants,
            "participant index {me} out of range for barrier of {}",
            self.participants
        );
        self.walk_up(me);
    }

    /// Arrival walk. One loop iteration per tree level, carrying
    /// `(level, me)` explicitly; the recursion depth of the textbook
    /// formulation is bounded by `depth`, but a flat loop keeps suspension
    /// points out of a growing call stack.
    fn walk_up(&self, me: usize) {
        let mut level = 0u32;
        loop {
            let pair = me ^ (1usize << level);
            if self.debug {
                trace!(me, pair, level, "barrier up-walk step");
            }

            if pair >= self.participants {
                // No partner in range: signal arrival, park for release,
                // then release my own subtree (I am its local root).
                self.up[me].write_ef(SIGNAL);
                self.down[me].read_fe::<u64>();
                if self.debug {
                    trace!(me, level, "released (no partner)");
                }
                if level != 0 {
                    self.release_down(me, level);
                }
                return;
            }

            if pair < me {
                // Follower at this level: the lower index climbs, I wait.
                self.up[me].write_ef(SIGNAL);
                if self.debug {
                    trace!(me, pair, level, "parked awaiting release");
                }
                self.down[me].read_fe::<u64>();
                if self.debug {
                    trace!(me, level, "released");
                }
                if level != 0 {
                    self.release_down(me, level);
                }
                return;
            }

            // Winner at this level: consume the partner's arrival, then
            // climb until the top of the tree (index 0 only).
            self.up[pair].read_fe::<u64>();
            if self.debug {
                trace!(me, pair, level, "partner arrived, climbing");
            }
            if level + 1 < self.depth || me != 0 {
                level += 1;
            } else {
                // Every participant has arrived; index 0 starts the release.
                // Slot 0 itself is never filled: nobody waits on it.
                if self.debug {
                    trace!(me, level, "starting down-walk");
                }
                self.release_down(me, level);
                return;
            }
        }
    }

    /// Release walk: signals the down-slot of every higher-indexed partner
    /// from `level` down to the leaves. Iterating every level within one
    /// call covers each leaf of the releaser's subtree exactly once.
    fn release_down(&self, me: usize, level: u32) {
        for i in (0..=level).rev() {
            let pair = me ^ (1usize << i);
            if pair < self.participants && pair > me {
                self.down[pair].write_ef(SIGNAL);
                if self.debug {
                    trace!(me, pair, level = i, "released down-slot");
                }
            }
        }
    }

    /// Returns true when every active slot in both arrays is Empty — the
    /// between-cycles resting state.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        let empty = |cell: &FebCell| cell.status() == FebState::Empty;
        self.up[..self.participants].iter().all(empty)
            && self.down[..self.participants].iter().all(empty)
    }

    /// Renders the requested slot arrays as fixed-width rows of eight tags
    /// (`E`/`F`), for human inspection only. The rendering is also emitted
    /// at debug level.
    #[must_use]
    pub fn dump(&self, scope: DumpScope) -> String {
        let mut out = String::new();
        if matches!(scope, DumpScope::Up | DumpScope::Both) {
            Self::render_slots(&mut out, "up", &self.up[..self.participants]);
        }
        if matches!(scope, DumpScope::Down | DumpScope::Both) {
            Self::render_slots(&mut out, "down", &self.down[..self.participants]);
        }
        debug!(dump = %out, "barrier slot dump");
        out
    }

    fn render_slots(out: &mut String, label: &str, slots: &[FebCell]) {
        let _ = writeln!(out, "{label}");
        for row in slots.chunks(8) {
            for cell in row {
                let tag = match cell.status() {
                    FebState::Empty => 'E',
                    FebState::Full => 'F',
                };
                let _ = write!(out, "{tag} ");
            }
            let _ = writeln!(out);
        }
    }
}
