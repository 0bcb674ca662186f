//! Navigation history: address backends and the transition engine.
//!
//! # Responsibilities
//! - Abstract over where the current address lives (`backend`)
//! - Provide concrete backends: in-memory, path-based, fragment-based
//! - Drive guarded transitions from one route to the next (`transition`)
//!
//! # Data Flow
//! ```text
//! push/replace            address change
//!      |                        |
//!      v                        v
//! +-----------------------------------+
//! |            transition             |
//! |  diff -> guard queues -> commit   |
//! +-----------------------------------+
//!      |                        ^
//!      v                        |
//! +-----------+          +-------------+
//! |  backend  | <------> | HostAddress |
//! +-----------+          +-------------+
//! ```

pub mod backend;
pub mod fragment;
pub mod memory;
pub mod path;
pub mod transition;

pub use backend::{AddressBackend, HostAddress};
pub use fragment::FragmentAddress;
pub use memory::MemoryAddress;
pub use path::PathAddress;
pub use transition::{History, TransitionOutcome};
