//! Shared utilities for the navigation integration tests.

use std::sync::{Arc, Mutex};

use waypoint::guards::{GuardFuture, GuardOutcome};
use waypoint::{
    ComponentRef, HostAddress, Route, RouteConfig, Router, RouterOptions, ViewComponent,
    ViewInstance,
};

/// In-process stand-in for a host address bar.
pub struct FakeHost {
    href: Mutex<String>,
    pub pushes: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn at(href: &str) -> Arc<Self> {
        Arc::new(Self {
            href: Mutex::new(href.to_string()),
            pushes: Mutex::new(Vec::new()),
        })
    }
}

impl HostAddress for FakeHost {
    fn read(&self) -> String {
        self.href.lock().unwrap().clone()
    }

    fn push(&self, href: &str) {
        *self.href.lock().unwrap() = href.to_string();
        self.pushes.lock().unwrap().push(href.to_string());
    }

    fn replace(&self, href: &str) {
        *self.href.lock().unwrap() = href.to_string();
    }

    fn go(&self, _delta: i32) {
        // A real host would move its own stack and notify the router.
    }
}

/// Component whose lifecycle hooks append tagged entries to a shared
/// log, so tests can assert exact guard ordering.
pub struct LoggingComponent {
    pub tag: &'static str,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl ViewComponent for LoggingComponent {
    fn before_route_enter(&self, _to: Route, _from: Route) -> Option<GuardFuture> {
        use futures_util::FutureExt;
        let log = self.log.clone();
        let tag = self.tag;
        Some(
            async move {
                log.lock().unwrap().push(format!("enter:{tag}"));
                GuardOutcome::Continue
            }
            .boxed(),
        )
    }
}

/// Instance counterpart of [`LoggingComponent`].
pub struct LoggingInstance {
    pub tag: &'static str,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl ViewInstance for LoggingInstance {
    fn before_route_leave(&self, _to: Route, _from: Route) -> Option<GuardFuture> {
        use futures_util::FutureExt;
        let log = self.log.clone();
        let tag = self.tag;
        Some(
            async move {
                log.lock().unwrap().push(format!("leave:{tag}"));
                GuardOutcome::Continue
            }
            .boxed(),
        )
    }

    fn before_route_update(&self, _to: Route, _from: Route) -> Option<GuardFuture> {
        use futures_util::FutureExt;
        let log = self.log.clone();
        let tag = self.tag;
        Some(
            async move {
                log.lock().unwrap().push(format!("update:{tag}"));
                GuardOutcome::Continue
            }
            .boxed(),
        )
    }
}

pub fn logging_component(tag: &'static str, log: &Arc<Mutex<Vec<String>>>) -> ComponentRef {
    ComponentRef::ready(LoggingComponent {
        tag,
        log: log.clone(),
    })
}

/// Memory-mode router over the given routes.
pub fn memory_router(routes: Vec<RouteConfig>) -> Router {
    Router::new(RouterOptions::new(routes)).expect("route set compiles")
}
