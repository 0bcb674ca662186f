//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (startup / add_routes):
//!     RouteConfig tree
//!     → map.rs (depth-first walk, path normalization, alias synthesis)
//!     → pattern.rs (compile each normalized path)
//!     → Freeze as RouteIndex (pathList / pathMap / nameMap)
//!
//! Location Resolution:
//!     RawLocation + current Route
//!     → location.rs (normalize: relative paths, params, query)
//!     → matcher.rs (name lookup or ordered path scan,
//!                   redirect/alias indirection)
//!     → Route (matched record chain, root to leaf)
//! ```
//!
//! # Design Decisions
//! - Index compiled up front, swapped atomically on addition
//! - Deterministic: same location always resolves to the same route
//! - First match wins; wildcards are ordered last

pub mod location;
pub mod map;
pub mod matcher;
pub mod pattern;
pub mod record;
pub mod route;
