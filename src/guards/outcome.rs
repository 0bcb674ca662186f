//! Guard signatures and the decoded guard result.

use std::fmt;
use std::sync::Arc;

use futures_util::future::{ready, BoxFuture};
use futures_util::FutureExt;

use crate::component::ViewInstance;
use crate::errors::BoxError;
use crate::routing::location::RawLocation;
use crate::routing::route::Route;

/// Callback buffered by an enter guard, invoked once the corresponding
/// component instance has been mounted by the view layer.
pub type InstanceCallback = Box<dyn FnOnce(Arc<dyn ViewInstance>) + Send>;

/// Boxed future produced by a guard invocation.
pub type GuardFuture = BoxFuture<'static, GuardOutcome>;

/// A navigation guard: `(to, from) -> outcome`.
pub type NavigationGuard = Arc<dyn Fn(Route, Route) -> GuardFuture + Send + Sync>;

/// Hook run after a transition has committed: `(to, previous)`.
pub type AfterHook = Arc<dyn Fn(&Route, &Route) + Send + Sync>;

/// Decoded result of a guard invocation.
pub enum GuardOutcome {
    /// Advance to the next guard in the queue.
    Continue,
    /// Abort the transition without an error value.
    Block,
    /// Abort the transition with an error surfaced to subscribers.
    Failure(BoxError),
    /// Abort the transition and begin a new one toward this location.
    Redirect(RawLocation),
    /// Advance, buffering a callback for the mounted instance.
    /// Only meaningful for component enter guards.
    Defer(InstanceCallback),
}

impl GuardOutcome {
    /// Abort with an error value.
    pub fn failure(err: impl Into<BoxError>) -> Self {
        GuardOutcome::Failure(err.into())
    }

    /// Redirect toward another location.
    pub fn redirect(to: impl Into<RawLocation>) -> Self {
        GuardOutcome::Redirect(to.into())
    }

    /// Advance and receive the mounted instance later.
    pub fn defer(cb: impl FnOnce(Arc<dyn ViewInstance>) + Send + 'static) -> Self {
        GuardOutcome::Defer(Box::new(cb))
    }
}

impl fmt::Debug for GuardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardOutcome::Continue => f.write_str("Continue"),
            GuardOutcome::Block => f.write_str("Block"),
            GuardOutcome::Failure(e) => write!(f, "Failure({e})"),
            GuardOutcome::Redirect(loc) => write!(f, "Redirect({loc:?})"),
            GuardOutcome::Defer(_) => f.write_str("Defer(..)"),
        }
    }
}

/// Build a guard from a synchronous decision function.
pub fn guard_fn<F>(f: F) -> NavigationGuard
where
    F: Fn(&Route, &Route) -> GuardOutcome + Send + Sync + 'static,
{
    Arc::new(move |to, from| {
        let outcome = f(&to, &from);
        ready(outcome).boxed()
    })
}

/// Build a guard from an async function.
pub fn async_guard_fn<F, Fut>(f: F) -> NavigationGuard
where
    F: Fn(Route, Route) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = GuardOutcome> + Send + 'static,
{
    Arc::new(move |to, from| f(to, from).boxed())
}

/// Build an after-hook from a plain function.
pub fn after_hook_fn<F>(f: F) -> AfterHook
where
    F: Fn(&Route, &Route) + Send + Sync + 'static,
{
    Arc::new(f)
}
