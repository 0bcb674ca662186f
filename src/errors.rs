//! Error taxonomy for route registration and navigation.
//!
//! # Responsibilities
//! - Configuration errors, reported eagerly when a route set is compiled
//! - Navigation errors, delivered through `push`/`replace` results and
//!   registered error subscribers
//!
//! # Design Decisions
//! - Configuration errors are fatal to the registration call only
//! - `Duplicated` is non-fatal by convention: explicit callers see it,
//!   implicit back/forward transitions suppress it
//! - No navigation error terminates the engine

use thiserror::Error;

/// Boxed error produced by user-supplied guards and component loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Malformed route configuration, detected at compile time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A route node did not declare a path.
    #[error("\"path\" is required in a route configuration (route: {name})")]
    MissingPath {
        /// Route name, or "<unnamed>" when the node has no name either.
        name: String,
    },

    /// A component was referenced by a bare string identifier.
    /// Indirection by name is not supported in this layer.
    #[error("route \"{path}\" references component by string id \"{id}\"; use an actual component reference")]
    ComponentByName { path: String, id: String },
}

/// Runtime navigation failures.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Re-navigation to the currently committed route.
    #[error("duplicate navigation to {to}")]
    Duplicated {
        /// Full path of the duplicated target.
        to: String,
    },

    /// A guard blocked the transition, optionally with an underlying error.
    #[error("navigation aborted")]
    Aborted {
        #[source]
        source: Option<BoxError>,
    },

    /// A lazily-loaded component failed to load.
    #[error("failed to resolve async component \"{view}\": {reason}")]
    ResolveFailed { view: String, reason: String },

    /// A newer transition took over before this one could commit.
    #[error("navigation superseded by a newer transition")]
    Superseded,
}

impl NavigationError {
    /// True for the non-fatal duplicate-navigation signal.
    pub fn is_duplicated(&self) -> bool {
        matches!(self, NavigationError::Duplicated { .. })
    }

    /// True when a newer transition silently cancelled this one.
    pub fn is_superseded(&self) -> bool {
        matches!(self, NavigationError::Superseded)
    }
}
