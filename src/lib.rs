//! Filament: full/empty-bit synchronization for lightweight-task runtimes.
//!
//! # Overview
//!
//! Filament is the synchronization substrate of a cooperative threading
//! runtime: a [full/empty-bit cell](cell::FebCell) that signals data
//! availability through a two-state tag, and a
//! [logarithmic tree barrier](barrier::Barrier) built directly on arrays of
//! those cells. Producers and consumers coordinate by the presence or
//! absence of a value — dataflow synchronization — rather than by separate
//! signaling objects.
//!
//! # Core Guarantees
//!
//! - **Atomic tag+value transitions**: a reader never observes a Full tag
//!   with a stale or partial value
//! - **One producer per edge**: exactly one `write_ef` completes per
//!   Empty→Full transition, exactly one `read_fe` per Full→Empty
//! - **Broadcast reads**: any number of `read_ff` callers observe a Full
//!   cell concurrently
//! - **O(log N) collectives**: each barrier participant performs a bounded
//!   number of signaling steps per cycle
//! - **Self-cleaning barrier**: all slots return to Empty after every
//!   cycle; no reset step between cycles
//!
//! Blocking operations suspend only the logical caller and are unbounded:
//! no timeouts, no cancellation, no fairness guarantee beyond eventual
//! wakeup.
//!
//! # Module Structure
//!
//! - [`word`]: compile-time word-width discipline for cell values
//! - [`park`]: the waiter-suspension contract with the host scheduler
//! - [`cell`]: the FEB cell and the binary lock built from it
//! - [`incr`]: atomic increment family (integer and floating point)
//! - [`barrier`]: the logarithmic up/down signaling tree
//! - [`rt`]: runtime context — fork, participant identity, global barrier
//! - [`reduce`]: generic parallel reduction client
//! - [`config`]: environment-variable configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod barrier;
pub mod cell;
pub mod config;
pub mod incr;
pub mod park;
pub mod reduce;
pub mod rt;
pub mod test_utils;
pub mod word;

pub use barrier::{Barrier, BarrierKind, DumpScope};
pub use cell::{FebCell, FebMutex, FebMutexGuard, FebState, TryReadError, TryWriteError};
pub use incr::{AtomicIncrement, IncrCell};
pub use park::{Transition, WakeMode};
pub use reduce::{reduce, Reducible, ReduceOp};
pub use rt::{Runtime, TaskHandle};
pub use word::Word;
