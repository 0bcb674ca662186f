//! End-to-end navigation scenarios across the matcher, the guard
//! pipeline and the address backends.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{logging_component, memory_router, FakeHost, LoggingInstance};
use waypoint::guards::{async_guard_fn, guard_fn, GuardOutcome};
use waypoint::{
    ComponentRef, HostAddress, LocationDescriptor, NavigationError, RawLocation, RouteConfig,
    Router, RouterMode, RouterOptions, ViewComponent, DEFAULT_VIEW,
};

struct Plain;
impl ViewComponent for Plain {}

#[tokio::test]
async fn duplicate_navigation_is_an_error_but_changes_nothing() {
    let router = memory_router(vec![RouteConfig::new("/a"), RouteConfig::new("/b")]);
    router.push("/a").await.expect("first");

    let err = router.push("/a").await.expect_err("duplicate");
    assert!(err.is_duplicated());
    assert_eq!(router.current_route().path, "/a");
}

#[tokio::test]
async fn guard_queue_runs_in_documented_order() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let router = memory_router(vec![
        RouteConfig::new("/parent")
            .component(logging_component("parent", &log))
            .child(
                RouteConfig::new("a").component(logging_component("a", &log)),
            )
            .child(
                RouteConfig::new("b")
                    .component(logging_component("b", &log))
                    .before_enter({
                        let log = log.clone();
                        guard_fn(move |_, _| {
                            log.lock().unwrap().push("beforeEnter:b".into());
                            GuardOutcome::Continue
                        })
                    }),
            ),
    ]);

    {
        let log = log.clone();
        router.before_each(guard_fn(move |_, _| {
            log.lock().unwrap().push("beforeEach".into());
            GuardOutcome::Continue
        }));
    }
    {
        let log = log.clone();
        router.before_resolve(guard_fn(move |_, _| {
            log.lock().unwrap().push("beforeResolve".into());
            GuardOutcome::Continue
        }));
    }
    {
        let log = log.clone();
        router.after_each(waypoint::after_hook_fn(move |to, _| {
            log.lock().unwrap().push(format!("afterEach:{}", to.path));
        }));
    }

    let route = router.push("/parent/a").await.expect("commit");

    // Mount instances so the sibling transition has leave guards.
    for record in &route.matched {
        let tag: &'static str = if record.path == "/parent" { "parent" } else { "a" };
        record.register_instance(
            DEFAULT_VIEW,
            Arc::new(LoggingInstance {
                tag,
                log: log.clone(),
            }),
        );
    }
    log.lock().unwrap().clear();

    router.push("/parent/b").await.expect("commit");

    assert_eq!(
        *log.lock().unwrap(),
        [
            "leave:a",
            "beforeEach",
            "update:parent",
            "beforeEnter:b",
            "enter:b",
            "beforeResolve",
            "afterEach:/parent/b",
        ]
    );
}

#[tokio::test]
async fn reused_ancestors_are_updated_not_reentered() {
    let router = memory_router(vec![RouteConfig::new("/u/:id").named("user")]);
    let first = router.push("/u/1").await.expect("commit");
    let second = router.push("/u/2").await.expect("commit");

    // Same record chain, different params.
    assert_eq!(first.matched.len(), second.matched.len());
    assert!(Arc::ptr_eq(&first.matched[0], &second.matched[0]));
    assert_eq!(second.params["id"], "2");
}

#[tokio::test]
async fn newer_navigation_supersedes_older_one() {
    let router = memory_router(vec![
        RouteConfig::new("/slow"),
        RouteConfig::new("/fast"),
    ]);
    router.before_each(async_guard_fn(|to, _from| async move {
        if to.path == "/slow" {
            tokio::time::sleep(Duration::from_millis(80)).await;
        }
        GuardOutcome::Continue
    }));

    let slow_router = router.clone();
    let slow = tokio::spawn(async move { slow_router.push("/slow").await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let fast = router.push("/fast").await.expect("newer wins");
    assert_eq!(fast.path, "/fast");

    let superseded = slow.await.expect("join").expect_err("older loses");
    assert!(superseded.is_superseded());
    assert_eq!(router.current_route().path, "/fast");
}

#[tokio::test]
async fn blocked_navigation_keeps_committed_route() {
    let router = memory_router(vec![RouteConfig::new("/a"), RouteConfig::new("/b")]);
    router.push("/a").await.expect("commit");

    router.before_each(guard_fn(|to, _| {
        if to.path == "/b" {
            GuardOutcome::Block
        } else {
            GuardOutcome::Continue
        }
    }));

    let errors = Arc::new(AtomicUsize::new(0));
    let seen = errors.clone();
    router.on_error(Arc::new(move |_err| {
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    let err = router.push("/b").await.expect_err("blocked");
    assert!(matches!(err, NavigationError::Aborted { .. }));
    assert_eq!(router.current_route().path, "/a");
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn guard_redirect_lands_on_the_final_route() {
    let router = memory_router(vec![
        RouteConfig::new("/admin"),
        RouteConfig::new("/login").named("login"),
    ]);
    router.before_each(guard_fn(|to, _| {
        if to.path == "/admin" {
            GuardOutcome::redirect(RawLocation::from(LocationDescriptor::named("login")))
        } else {
            GuardOutcome::Continue
        }
    }));

    let route = router.push("/admin").await.expect("redirected commit");
    assert_eq!(route.path, "/login");
    assert_eq!(route.name.as_deref(), Some("login"));
}

#[tokio::test]
async fn record_redirects_carry_query_and_mark_origin() {
    let router = memory_router(vec![
        RouteConfig::new("/old/:id").redirect("/new/:id"),
        RouteConfig::new("/new/:id"),
    ]);

    let route = router.push("/old/5?keep=1").await.expect("commit");
    assert_eq!(route.path, "/new/5");
    assert_eq!(route.query["keep"], "1");
    assert_eq!(route.redirected_from.as_deref(), Some("/old/5?keep=1"));
}

#[tokio::test]
async fn failed_lazy_component_aborts_with_resolve_error() {
    let router = memory_router(vec![RouteConfig::new("/broken").component(
        ComponentRef::lazy(|| async { Err("chunk load failed".into()) }),
    )]);

    let err = router.push("/broken").await.expect_err("load fails");
    let NavigationError::Aborted {
        source: Some(source),
    } = err
    else {
        panic!("expected aborted with source, got {err}");
    };
    let nav = source.downcast::<NavigationError>().expect("inner kind");
    assert!(matches!(*nav, NavigationError::ResolveFailed { .. }));
    assert_eq!(router.current_route().path, "/");
}

#[tokio::test]
async fn successful_lazy_component_is_cached_for_reentry() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let router = memory_router(vec![
        RouteConfig::new("/lazy").component(ComponentRef::lazy(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Plain) as Arc<dyn ViewComponent>)
            }
        })),
        RouteConfig::new("/away"),
    ]);

    router.push("/lazy").await.expect("first entry");
    router.push("/away").await.expect("leave");
    router.push("/lazy").await.expect("re-entry");
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn on_ready_fires_exactly_once() {
    let router = memory_router(vec![RouteConfig::new("/a"), RouteConfig::new("/b")]);

    let fired = Arc::new(AtomicUsize::new(0));
    let seen = fired.clone();
    router.on_ready(move |route| {
        assert_eq!(route.path, "/a");
        seen.fetch_add(1, Ordering::SeqCst);
    });

    router.push("/a").await.expect("first");
    router.push("/b").await.expect("second");
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // After readiness, registration fires immediately with the
    // current route.
    let seen = fired.clone();
    router.on_ready(move |route| {
        assert_eq!(route.path, "/b");
        seen.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn add_routes_rematches_the_current_address() {
    let router = memory_router(vec![RouteConfig::new("/known")]);
    let listener_paths = Arc::new(Mutex::new(Vec::new()));
    let paths = listener_paths.clone();
    router.set_listener(Arc::new(move |route| {
        paths.lock().unwrap().push(route.full_path.clone());
    }));

    let unmatched = router.push("/plugin").await.expect("commits unmatched");
    assert!(unmatched.matched.is_empty());

    router
        .add_routes(&[RouteConfig::new("/plugin").named("plugin")])
        .await
        .expect("add_routes");

    let current = router.current_route();
    assert_eq!(current.name.as_deref(), Some("plugin"));
    assert_eq!(current.matched.len(), 1);
    assert_eq!(*listener_paths.lock().unwrap(), ["/plugin", "/plugin"]);
}

#[tokio::test]
async fn deferred_enter_callback_reaches_the_mounted_instance() {
    struct Deferring;
    impl ViewComponent for Deferring {
        fn before_route_enter(
            &self,
            _to: waypoint::Route,
            _from: waypoint::Route,
        ) -> Option<waypoint::GuardFuture> {
            use futures_util::FutureExt;
            Some(async { GuardOutcome::defer(|_instance| {}) }.boxed())
        }
    }

    let router = memory_router(vec![
        RouteConfig::new("/v").component(ComponentRef::ready(Deferring))
    ]);
    let route = router.push("/v").await.expect("commit");

    // Nothing mounted yet; the callback waits. Mount, then give the
    // poller a couple of intervals.
    let log = Arc::new(Mutex::new(Vec::new()));
    route.matched[0].register_instance(
        DEFAULT_VIEW,
        Arc::new(LoggingInstance {
            tag: "v",
            log: log.clone(),
        }),
    );
    tokio::time::sleep(Duration::from_millis(60)).await;
    // The callback received an instance; the poller has stopped. The
    // assertion is indirect: no panic, and the route is still current.
    assert_eq!(router.current_route().path, "/v");
}

#[tokio::test]
async fn path_mode_writes_through_the_host_address() {
    let host = FakeHost::at("/base/");
    let router = Router::new(
        RouterOptions::new(vec![
            RouteConfig::new("/").named("home"),
            RouteConfig::new("/docs/:page"),
        ])
        .mode(RouterMode::Path(host.clone()))
        .base("/base"),
    )
    .expect("router");

    router.init().await.expect("initial transition");
    assert_eq!(router.current_route().path, "/");

    router.push("/docs/intro?v=2").await.expect("commit");
    assert_eq!(host.read(), "/base/docs/intro?v=2");
    assert_eq!(
        host.pushes.lock().unwrap().as_slice(),
        ["/base/docs/intro?v=2"]
    );

    // The host moved the address on its own (back button).
    host.replace("/base/");
    let route = router
        .handle_address_change()
        .await
        .expect("address change");
    assert_eq!(route.path, "/");
}

#[tokio::test]
async fn wildcard_route_catches_everything_else() {
    let router = memory_router(vec![
        RouteConfig::new("/real"),
        RouteConfig::new("*").named("not-found"),
    ]);

    let route = router.push("/no/such/page").await.expect("commit");
    assert_eq!(route.name.as_deref(), Some("not-found"));
    assert_eq!(route.params["pathMatch"], "/no/such/page");

    let real = router.push("/real").await.expect("commit");
    assert_eq!(real.name, None);
    assert_eq!(real.matched[0].path, "/real");
}

#[tokio::test]
async fn alias_navigation_keeps_the_alias_path_visible() {
    let router = memory_router(vec![
        RouteConfig::new("/people/:id").named("person").alias("/u/:id")
    ]);

    let route = router.push("/u/9").await.expect("commit");
    assert_eq!(route.path, "/u/9");
    assert_eq!(route.params["id"], "9");
    assert_eq!(route.matched.last().expect("leaf").path, "/people/:id");
}
