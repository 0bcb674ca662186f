//! Guard pipeline building blocks.
//!
//! # Data Flow
//! ```text
//! Transition (history::transition):
//!     chain diff → extract.rs (ordered, instance-bound guard list)
//!               → resolve.rs (one synthetic entry per transition that
//!                              loads every lazy component among the
//!                              activated records)
//!     each queue entry → GuardOutcome, decoded once at the boundary
//! ```
//!
//! # Design Decisions
//! - Heterogeneous guard results become one tagged union instead of
//!   runtime type probing
//! - Guards are async functions; sequencing is plain `await` in queue
//!   order, cancellation is a generation check between entries
//! - A guard that never resolves stalls its transition; that is a
//!   caller contract, not enforced here

pub mod extract;
pub mod outcome;
pub mod resolve;

pub use outcome::{
    after_hook_fn, async_guard_fn, guard_fn, AfterHook, GuardFuture, GuardOutcome,
    InstanceCallback, NavigationGuard,
};
