//! The public navigation handle.
//!
//! # Responsibilities
//! - Tie the matcher, the transition engine and an address backend
//!   together behind one cheaply clonable handle
//! - Run the public navigation operations: `push`, `replace`, `go`,
//!   `resolve`, `add_routes`
//! - Hold the global hook registrations and hand out removal handles
//!
//! # Design Decisions
//! - Guard redirects are followed inside `push`/`replace`, so the
//!   caller's future settles with the terminal outcome of the whole
//!   chain, not of the first hop
//! - `Duplicated` is an error for explicit calls but suppressed for
//!   address-driven transitions, where re-notification is routine
//! - Hook lists are snapshotted per transition; removing a hook never
//!   affects a transition already in flight

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::component::ComponentRef;
use crate::config::schema::RouteConfig;
use crate::errors::{BoxError, ConfigError, NavigationError};
use crate::guards::{AfterHook, NavigationGuard};
use crate::history::backend::{AddressBackend, HostAddress};
use crate::history::transition::{
    AddressSync, ErrorSubscriber, History, HookSnapshot, RouteListener, TransitionOutcome,
};
use crate::history::{FragmentAddress, MemoryAddress, PathAddress};
use crate::routing::location::RawLocation;
use crate::routing::matcher::{Matcher, MAX_REDIRECT_DEPTH};
use crate::routing::route::Route;

/// Which address backend the router drives.
pub enum RouterMode {
    /// Self-contained history stack; no host involved.
    Memory,
    /// The full path lives in the host address.
    Path(Arc<dyn HostAddress>),
    /// The full path lives after a `#` in the host address.
    Fragment(Arc<dyn HostAddress>),
}

/// Construction options for [`Router::new`].
pub struct RouterOptions {
    pub routes: Vec<RouteConfig>,
    pub mode: RouterMode,
    /// Base path stripped from and prepended to every address.
    pub base: Option<String>,
}

impl RouterOptions {
    pub fn new(routes: Vec<RouteConfig>) -> Self {
        Self {
            routes,
            mode: RouterMode::Memory,
            base: None,
        }
    }

    pub fn mode(mut self, mode: RouterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }
}

/// A pre-computed navigation target.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub route: Route,
    /// Href the backend would show for this route.
    pub href: String,
}

/// Registered hook that can be removed out of order.
struct HookList<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, T)>>,
}

impl<T: Clone> HookList<T> {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    fn add(&self, hook: T) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, hook));
        id
    }

    fn remove(&self, id: u64) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(entry_id, _)| *entry_id != id);
    }

    fn snapshot(&self) -> Vec<T> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, hook)| hook.clone())
            .collect()
    }
}

struct HookRegistry {
    before: HookList<NavigationGuard>,
    resolve: HookList<NavigationGuard>,
    after: HookList<AfterHook>,
    errors: HookList<ErrorSubscriber>,
}

impl HookRegistry {
    fn new() -> Self {
        Self {
            before: HookList::new(),
            resolve: HookList::new(),
            after: HookList::new(),
            errors: HookList::new(),
        }
    }

    fn snapshot(&self) -> HookSnapshot {
        HookSnapshot {
            before: self.before.snapshot(),
            resolve: self.resolve.snapshot(),
            after: self.after.snapshot(),
            errors: self.errors.snapshot(),
        }
    }
}

/// Undoes one hook registration.
pub struct HookHandle {
    remove: Box<dyn FnOnce() + Send>,
}

impl HookHandle {
    /// Remove the registered hook. Transitions already in flight keep
    /// their snapshot.
    pub fn remove(self) {
        (self.remove)();
    }
}

struct RouterInner {
    matcher: Matcher,
    history: Arc<History>,
    hooks: HookRegistry,
}

/// The navigation engine handle. Clones share all state.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// Compile the route set and set up the chosen address backend.
    pub fn new(options: RouterOptions) -> Result<Self, ConfigError> {
        let matcher = Matcher::new(&options.routes)?;
        let base = options.base.as_deref();
        let backend: Box<dyn AddressBackend> = match options.mode {
            RouterMode::Memory => Box::new(MemoryAddress::new()),
            RouterMode::Path(host) => Box::new(PathAddress::new(host, base)),
            RouterMode::Fragment(host) => Box::new(FragmentAddress::new(host, base)),
        };
        Ok(Self {
            inner: Arc::new(RouterInner {
                matcher,
                history: Arc::new(History::new(backend)),
                hooks: HookRegistry::new(),
            }),
        })
    }

    /// Run the initial transition toward whatever the backend shows.
    /// Call once after construction and hook registration.
    pub async fn init(&self) -> Result<Route, NavigationError> {
        let location = self.inner.history.backend().location();
        tracing::debug!(location, "router init");
        self.navigate(RawLocation::Path(location), AddressSync::Ensure)
            .await
    }

    /// Navigate to a new history entry.
    pub async fn push(&self, to: impl Into<RawLocation>) -> Result<Route, NavigationError> {
        self.navigate(to.into(), AddressSync::Push).await
    }

    /// Navigate, replacing the current history entry.
    pub async fn replace(&self, to: impl Into<RawLocation>) -> Result<Route, NavigationError> {
        self.navigate(to.into(), AddressSync::Replace).await
    }

    /// Follows guard redirects until the chain terminates, so the
    /// returned result is the outcome of the final hop.
    async fn navigate(
        &self,
        mut raw: RawLocation,
        mut sync: AddressSync,
    ) -> Result<Route, NavigationError> {
        for _ in 0..MAX_REDIRECT_DEPTH {
            let current = self.inner.history.current_route();
            let to = self.inner.matcher.match_location(&raw, Some(&current));
            let hooks = self.inner.hooks.snapshot();

            match self.inner.history.transition(to, sync, hooks).await {
                TransitionOutcome::Committed(route) => return Ok(route),
                TransitionOutcome::Duplicated(route) => {
                    return Err(NavigationError::Duplicated {
                        to: route.full_path,
                    })
                }
                TransitionOutcome::Aborted(err) => return Err(err),
                TransitionOutcome::Superseded => return Err(NavigationError::Superseded),
                TransitionOutcome::Redirected { to, replace } => {
                    if replace {
                        sync = AddressSync::Replace;
                    }
                    raw = to;
                }
            }
        }

        let source: BoxError = format!(
            "more than {MAX_REDIRECT_DEPTH} guard redirects without settling"
        )
        .into();
        Err(NavigationError::Aborted {
            source: Some(source),
        })
    }

    /// Transition to the location the backend currently shows. The
    /// host calls this when the address changed underneath the engine.
    pub async fn handle_address_change(&self) -> Result<Route, NavigationError> {
        let location = self.inner.history.backend().location();
        match self
            .navigate(RawLocation::Path(location), AddressSync::Ensure)
            .await
        {
            Ok(route) => Ok(route),
            // Re-notification of the current address is routine here.
            Err(err) if err.is_duplicated() => Ok(self.current_route()),
            Err(err) => Err(err),
        }
    }

    /// Move through history by a relative delta. Resolves to the
    /// transition result for self-contained backends; `None` when the
    /// host notifies asynchronously or the delta is out of range.
    pub async fn go(&self, delta: i32) -> Option<Result<Route, NavigationError>> {
        let target = self.inner.history.backend().go(delta)?;
        let result = match self
            .navigate(RawLocation::Path(target), AddressSync::Ensure)
            .await
        {
            Err(err) if err.is_duplicated() => Ok(self.current_route()),
            other => other,
        };
        Some(result)
    }

    pub async fn back(&self) -> Option<Result<Route, NavigationError>> {
        self.go(-1).await
    }

    pub async fn forward(&self) -> Option<Result<Route, NavigationError>> {
        self.go(1).await
    }

    /// Resolve a location without navigating. The href reflects what
    /// was asked for: a redirected route keeps its pre-redirect path.
    pub fn resolve(&self, to: impl Into<RawLocation>) -> Resolution {
        let current = self.inner.history.current_route();
        let route = self.inner.matcher.match_location(&to.into(), Some(&current));
        let shown = route
            .redirected_from
            .as_deref()
            .unwrap_or(&route.full_path);
        let href = self.inner.history.backend().make_href(shown);
        Resolution { route, href }
    }

    /// Merge additional routes into the live route map. When a route
    /// has already committed, the current location is re-resolved so a
    /// previously unmatched address can pick up its new route.
    pub async fn add_routes(&self, routes: &[RouteConfig]) -> Result<(), ConfigError> {
        self.inner.matcher.add_routes(routes)?;
        if self.inner.history.is_ready() {
            if let Err(err) = self.handle_address_change().await {
                tracing::debug!(error = %err, "re-resolution after add_routes did not commit");
            }
        }
        Ok(())
    }

    /// The committed route.
    pub fn current_route(&self) -> Route {
        self.inner.history.current_route()
    }

    /// Components of the currently matched chain, root to leaf, with
    /// their view names.
    pub fn get_matched_components(&self) -> Vec<(String, ComponentRef)> {
        self.current_route()
            .matched
            .iter()
            .flat_map(|record| record.components())
            .collect()
    }

    /// Install the listener notified with every committed route.
    pub fn set_listener(&self, listener: RouteListener) {
        self.inner.history.set_listener(listener);
    }

    /// Guard run before every transition is confirmed.
    pub fn before_each(&self, guard: NavigationGuard) -> HookHandle {
        let id = self.inner.hooks.before.add(guard);
        let inner = self.inner.clone();
        HookHandle {
            remove: Box::new(move || inner.hooks.before.remove(id)),
        }
    }

    /// Guard run after async components resolved, right before commit.
    pub fn before_resolve(&self, guard: NavigationGuard) -> HookHandle {
        let id = self.inner.hooks.resolve.add(guard);
        let inner = self.inner.clone();
        HookHandle {
            remove: Box::new(move || inner.hooks.resolve.remove(id)),
        }
    }

    /// Hook run after every committed transition.
    pub fn after_each(&self, hook: AfterHook) -> HookHandle {
        let id = self.inner.hooks.after.add(hook);
        let inner = self.inner.clone();
        HookHandle {
            remove: Box::new(move || inner.hooks.after.remove(id)),
        }
    }

    /// Subscriber notified when any transition fails.
    pub fn on_error(&self, subscriber: ErrorSubscriber) -> HookHandle {
        let id = self.inner.hooks.errors.add(subscriber);
        let inner = self.inner.clone();
        HookHandle {
            remove: Box::new(move || inner.hooks.errors.remove(id)),
        }
    }

    /// Callback for the first settled transition; fires immediately if
    /// it already settled.
    pub fn on_ready<F>(&self, cb: F)
    where
        F: FnOnce(&Route) + Send + 'static,
    {
        self.inner.history.on_ready(Box::new(cb), None);
    }

    /// Like [`Router::on_ready`], with a callback for the case where
    /// the first transition fails instead.
    pub fn on_ready_or<F, E>(&self, cb: F, error_cb: E)
    where
        F: FnOnce(&Route) + Send + 'static,
        E: FnOnce(&NavigationError) + Send + 'static,
    {
        self.inner
            .history
            .on_ready(Box::new(cb), Some(Box::new(error_cb)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::{guard_fn, GuardOutcome};
    use std::sync::atomic::AtomicUsize;

    fn router(routes: Vec<RouteConfig>) -> Router {
        Router::new(RouterOptions::new(routes)).expect("router")
    }

    #[tokio::test]
    async fn test_push_commits_and_duplicates_error() {
        let r = router(vec![RouteConfig::new("/a")]);
        let route = r.push("/a").await.expect("commit");
        assert_eq!(route.path, "/a");

        let err = r.push("/a").await.expect_err("duplicate");
        assert!(err.is_duplicated());
    }

    #[tokio::test]
    async fn test_push_follows_guard_redirect_to_terminal_route() {
        let r = router(vec![
            RouteConfig::new("/private"),
            RouteConfig::new("/login"),
        ]);
        r.before_each(guard_fn(|to, _| {
            if to.path == "/private" {
                GuardOutcome::redirect("/login")
            } else {
                GuardOutcome::Continue
            }
        }));

        let route = r.push("/private").await.expect("commit");
        assert_eq!(route.path, "/login");
        assert_eq!(r.current_route().path, "/login");
    }

    #[tokio::test]
    async fn test_removed_hook_no_longer_runs() {
        let r = router(vec![RouteConfig::new("/a"), RouteConfig::new("/b")]);
        let handle = r.before_each(guard_fn(|_, _| GuardOutcome::Block));

        assert!(r.push("/a").await.is_err());
        handle.remove();
        assert!(r.push("/a").await.is_ok());
        assert!(r.push("/b").await.is_ok());
    }

    #[tokio::test]
    async fn test_go_walks_memory_history() {
        let r = router(vec![RouteConfig::new("/a"), RouteConfig::new("/b")]);
        r.push("/a").await.expect("a");
        r.push("/b").await.expect("b");

        let back = r.back().await.expect("in range").expect("commit");
        assert_eq!(back.path, "/a");
        let fwd = r.forward().await.expect("in range").expect("commit");
        assert_eq!(fwd.path, "/b");
        assert!(r.forward().await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_does_not_navigate() {
        let r = router(vec![RouteConfig::new("/x/:id").named("x")]);
        let resolution = r.resolve("/x/3?q=1");
        assert_eq!(resolution.route.params["id"], "3");
        assert_eq!(resolution.href, "/x/3?q=1");
        assert_eq!(r.current_route().path, "/");
    }

    #[tokio::test]
    async fn test_resolve_href_keeps_pre_redirect_path() {
        let r = router(vec![
            RouteConfig::new("/old").redirect("/new"),
            RouteConfig::new("/new"),
        ]);
        let resolution = r.resolve("/old");
        assert_eq!(resolution.route.path, "/new");
        assert_eq!(resolution.href, "/old");
    }

    #[tokio::test]
    async fn test_add_routes_rescues_unmatched_address() {
        let r = router(vec![RouteConfig::new("/old")]);
        let unmatched = r.push("/new").await.expect("commits with empty chain");
        assert!(unmatched.matched.is_empty());

        r.add_routes(&[RouteConfig::new("/new")])
            .await
            .expect("add_routes");
        assert_eq!(r.current_route().matched.len(), 1);
    }

    #[tokio::test]
    async fn test_after_each_sees_both_routes() {
        let r = router(vec![RouteConfig::new("/a")]);
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        r.after_each(Arc::new(move |to, from| {
            assert_eq!(to.path, "/a");
            assert_eq!(from.path, "/");
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        r.push("/a").await.expect("commit");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
