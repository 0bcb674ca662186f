//! waypoint: a client-side navigation engine.
//!
//! Compiles a declarative route tree into a matchable index, resolves
//! locations against it, and drives guarded transitions from the
//! committed route to the next one.
//!
//! # Architecture
//! ```text
//! RouteConfig tree
//!     → routing::map (compile: path list, path map, name map)
//!     → routing::matcher (resolve location → Route, redirects, aliases)
//!
//! Router::push / replace / address change
//!     → history::transition (diff chains, run guard queues, commit)
//!     → history backend (memory / path / fragment address)
//!     → listener + after hooks + ready callbacks
//! ```
//!
//! # Quick start
//! ```no_run
//! use waypoint::{Router, RouterOptions, RouteConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let router = Router::new(RouterOptions::new(vec![
//!     RouteConfig::new("/").named("home"),
//!     RouteConfig::new("/users/:id").named("user"),
//! ]))?;
//! router.init().await?;
//!
//! let route = router.push("/users/7?tab=posts").await?;
//! assert_eq!(route.params["id"], "7");
//! # Ok(())
//! # }
//! ```

pub mod component;
pub mod config;
pub mod errors;
pub mod guards;
pub mod history;
pub mod router;
pub mod routing;

pub use component::{ComponentLoader, ComponentRef, ViewComponent, ViewInstance};
pub use config::{PropsSpec, RedirectTarget, RouteConfig};
pub use errors::{BoxError, ConfigError, NavigationError};
pub use guards::{
    after_hook_fn, async_guard_fn, guard_fn, AfterHook, GuardFuture, GuardOutcome,
    NavigationGuard,
};
pub use history::backend::HostAddress;
pub use history::transition::{ErrorSubscriber, RouteListener};
pub use router::{HookHandle, Resolution, Router, RouterMode, RouterOptions};
pub use routing::location::{LocationDescriptor, RawLocation};
pub use routing::record::{RouteRecord, DEFAULT_VIEW};
pub use routing::route::{is_same_route, Route};
