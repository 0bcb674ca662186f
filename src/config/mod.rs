//! Route configuration.
//!
//! # Responsibilities
//! - Declarative route tree supplied by the host application
//! - Builder API for constructing configs programmatically
//!
//! # Design Decisions
//! - Configuration is programmatic, not deserialized: component
//!   references and guards are not serializable
//! - Semantic validation happens in the route map compiler, eagerly,
//!   and is fatal to that registration call only

pub mod schema;

pub use schema::{PropsSpec, RedirectTarget, RouteConfig};
