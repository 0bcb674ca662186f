//! View-layer interface.
//!
//! # Responsibilities
//! - Opaque component references, including lazily-loaded ones
//! - Lifecycle hook seams for components and their mounted instances
//!
//! # Design Decisions
//! - This core never creates or destroys instances; the external view
//!   layer registers them per record and view name
//! - Hooks default to `None`, meaning the component does not take part
//!   in that phase
//! - Lazy loaders are plain async functions so the host decides how a
//!   component is actually fetched

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::errors::BoxError;
use crate::guards::GuardFuture;
use crate::routing::route::Route;

/// Loader for a lazily-resolved component.
pub type ComponentLoader =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn ViewComponent>, BoxError>> + Send + Sync>;

/// Reference to a view component, as supplied in route configuration.
#[derive(Clone)]
pub enum ComponentRef {
    /// A component that is available immediately.
    Ready(Arc<dyn ViewComponent>),
    /// A component resolved on first navigation into its route.
    Lazy(ComponentLoader),
    /// A bare string identifier. Rejected at compile time; indirection
    /// by name is not supported in this layer.
    Named(String),
}

impl ComponentRef {
    /// Wrap a ready component.
    pub fn ready(component: impl ViewComponent + 'static) -> Self {
        ComponentRef::Ready(Arc::new(component))
    }

    /// Wrap an async loader.
    pub fn lazy<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Arc<dyn ViewComponent>, BoxError>>
            + Send
            + 'static,
    {
        ComponentRef::Lazy(Arc::new(move || Box::pin(loader())))
    }

    /// True once the component no longer needs loading.
    pub fn is_ready(&self) -> bool {
        matches!(self, ComponentRef::Ready(_))
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentRef::Ready(_) => f.write_str("ComponentRef::Ready"),
            ComponentRef::Lazy(_) => f.write_str("ComponentRef::Lazy"),
            ComponentRef::Named(id) => write!(f, "ComponentRef::Named({id:?})"),
        }
    }
}

/// A renderable component definition.
///
/// The enter hook runs before the route is confirmed, so no instance
/// exists yet. Returning a [`GuardOutcome::Defer`] outcome buffers a
/// callback that receives the instance once the view layer mounts it.
///
/// [`GuardOutcome::Defer`]: crate::guards::GuardOutcome::Defer
pub trait ViewComponent: Send + Sync {
    /// Guard run when a route rendering this component is entered.
    /// `None` means the component defines no enter hook.
    fn before_route_enter(&self, to: Route, from: Route) -> Option<GuardFuture> {
        let _ = (to, from);
        None
    }
}

/// A live, mounted component instance.
///
/// Leave and update guards execute with the instance as receiver, which
/// is why they live here rather than on [`ViewComponent`].
pub trait ViewInstance: Send + Sync {
    /// Guard run when the route rendering this instance is left.
    fn before_route_leave(&self, to: Route, from: Route) -> Option<GuardFuture> {
        let _ = (to, from);
        None
    }

    /// Guard run when the route is reused with different params.
    fn before_route_update(&self, to: Route, from: Route) -> Option<GuardFuture> {
        let _ = (to, from);
        None
    }
}
