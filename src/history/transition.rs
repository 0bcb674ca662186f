//! Guarded transition engine.
//!
//! # Responsibilities
//! - Own the committed route and the pending-transition bookkeeping
//! - Diff the outgoing and incoming record chains
//! - Run the guard queues in order and decode each outcome
//! - Commit: swap the current route, sync the address backend, notify
//!   listeners, flush ready callbacks
//!
//! # Design Decisions
//! - One guard at a time: the queue is strictly sequential, and a
//!   guard that never settles stalls only its own transition
//! - Cancellation by generation: every transition claims a fresh
//!   generation, and a stale generation stops at the next queue step
//! - The state mutex is never held across an await; guards run on
//!   clones of the route values

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::errors::NavigationError;
use crate::guards::extract::{enter_guards, leave_guards, update_guards, QueueEntry};
use crate::guards::resolve::resolver_entry;
use crate::guards::{AfterHook, GuardOutcome, InstanceCallback, NavigationGuard};
use crate::history::backend::AddressBackend;
use crate::routing::location::RawLocation;
use crate::routing::record::RouteRecord;
use crate::routing::route::{is_same_route, Route};

/// Interval at which a buffered enter callback re-checks for its
/// mounted instance.
const INSTANCE_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Subscriber notified when a transition fails.
pub type ErrorSubscriber = Arc<dyn Fn(&NavigationError) + Send + Sync>;

/// Listener invoked with every newly committed route.
pub type RouteListener = Arc<dyn Fn(&Route) + Send + Sync>;

type ReadyCallback = Box<dyn FnOnce(&Route) + Send>;
type ReadyErrorCallback = Box<dyn FnOnce(&NavigationError) + Send>;

/// How a committed transition is persisted to the address backend.
#[derive(Debug, Clone, Copy)]
pub(crate) enum AddressSync {
    /// New entry.
    Push,
    /// Replace the current entry.
    Replace,
    /// The address already moved (back/forward); only correct drift.
    Ensure,
}

/// The hook lists active for one transition, snapshotted at start so
/// un-registration mid-flight cannot skip or double-run a guard.
#[derive(Default)]
pub(crate) struct HookSnapshot {
    pub before: Vec<NavigationGuard>,
    pub resolve: Vec<NavigationGuard>,
    pub after: Vec<AfterHook>,
    pub errors: Vec<ErrorSubscriber>,
}

/// Terminal state of one transition attempt.
pub enum TransitionOutcome {
    /// The route was committed.
    Committed(Route),
    /// The target equals the committed route; nothing changed.
    Duplicated(Route),
    /// A guard stopped the transition.
    Aborted(NavigationError),
    /// A guard asked for a different location instead.
    Redirected { to: RawLocation, replace: bool },
    /// A newer transition claimed the engine first.
    Superseded,
}

struct HistoryState {
    current: Route,
    /// Monotonic transition counter; the live transition's claim.
    generation: u64,
    pending: Option<u64>,
    /// Set once the first transition settles either way.
    ready: bool,
    ready_cbs: Vec<ReadyCallback>,
    ready_error_cbs: Vec<ReadyErrorCallback>,
    listener: Option<RouteListener>,
}

/// The committed route plus the machinery that replaces it.
///
/// State sits behind an `Arc` so the deferred-callback pollers can
/// keep checking the committed route without holding the history.
pub struct History {
    backend: Box<dyn AddressBackend>,
    state: Arc<Mutex<HistoryState>>,
}

enum QueueResult {
    Completed,
    Stopped(TransitionOutcome),
}

impl History {
    pub(crate) fn new(backend: Box<dyn AddressBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(HistoryState {
                current: Route::start(),
                generation: 0,
                pending: None,
                ready: false,
                ready_cbs: Vec::new(),
                ready_error_cbs: Vec::new(),
                listener: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The committed route.
    pub fn current_route(&self) -> Route {
        self.lock().current.clone()
    }

    pub(crate) fn backend(&self) -> &dyn AddressBackend {
        self.backend.as_ref()
    }

    /// True once the first transition has settled.
    pub(crate) fn is_ready(&self) -> bool {
        self.lock().ready
    }

    pub(crate) fn set_listener(&self, listener: RouteListener) {
        self.lock().listener = Some(listener);
    }

    /// Register callbacks for the first settled transition. Fires
    /// immediately when the engine is already ready.
    pub(crate) fn on_ready(
        &self,
        cb: ReadyCallback,
        error_cb: Option<ReadyErrorCallback>,
    ) {
        let current = {
            let mut state = self.lock();
            if !state.ready {
                state.ready_cbs.push(cb);
                if let Some(error_cb) = error_cb {
                    state.ready_error_cbs.push(error_cb);
                }
                return;
            }
            state.current.clone()
        };
        cb(&current);
    }

    /// Drive one transition to its terminal state.
    pub(crate) async fn transition(
        &self,
        to: Route,
        sync: AddressSync,
        hooks: HookSnapshot,
    ) -> TransitionOutcome {
        let (generation, from, ready) = {
            let mut state = self.lock();
            state.generation += 1;
            let generation = state.generation;
            state.pending = Some(generation);
            (generation, state.current.clone(), state.ready)
        };

        // The initial transition always runs in full, so guards see
        // the real starting navigation. Chain length is compared so a
        // route re-resolved over a grown route map is not a duplicate.
        if ready && is_same_route(&to, &from) && to.matched.len() == from.matched.len() {
            self.ensure_address(&to);
            let mut state = self.lock();
            if state.pending == Some(generation) {
                state.pending = None;
            }
            return TransitionOutcome::Duplicated(to);
        }

        tracing::debug!(
            from = %from.full_path,
            to = %to.full_path,
            generation,
            "transition begins"
        );

        let (updated, deactivated, activated) = resolve_queue(&from.matched, &to.matched);

        let mut queue: Vec<QueueEntry> = Vec::new();
        queue.extend(leave_guards(&deactivated));
        queue.extend(hooks.before.iter().cloned().map(QueueEntry::plain));
        queue.extend(update_guards(&updated));
        for record in &activated {
            if let Some(guard) = &record.before_enter {
                queue.push(QueueEntry::plain(guard.clone()));
            }
        }
        if let Some(entry) = resolver_entry(&activated) {
            queue.push(entry);
        }

        let mut deferred: Vec<(Arc<RouteRecord>, String, InstanceCallback)> = Vec::new();

        if let QueueResult::Stopped(outcome) = self
            .run_queue(queue, &to, &from, generation, &hooks, &mut deferred)
            .await
        {
            return outcome;
        }

        // Second phase: components are resolved now, so their enter
        // guards and the resolve hooks can run.
        let mut queue = enter_guards(&activated);
        queue.extend(hooks.resolve.iter().cloned().map(QueueEntry::plain));

        if let QueueResult::Stopped(outcome) = self
            .run_queue(queue, &to, &from, generation, &hooks, &mut deferred)
            .await
        {
            return outcome;
        }

        if !self.commit(to.clone(), from, sync, generation, &hooks, deferred) {
            tracing::debug!(generation, "transition superseded before commit");
            return TransitionOutcome::Superseded;
        }
        TransitionOutcome::Committed(to)
    }

    async fn run_queue(
        &self,
        queue: Vec<QueueEntry>,
        to: &Route,
        from: &Route,
        generation: u64,
        hooks: &HookSnapshot,
        deferred: &mut Vec<(Arc<RouteRecord>, String, InstanceCallback)>,
    ) -> QueueResult {
        for entry in queue {
            if self.lock().pending != Some(generation) {
                tracing::debug!(generation, "transition superseded mid-queue");
                return QueueResult::Stopped(TransitionOutcome::Superseded);
            }

            match (entry.guard)(to.clone(), from.clone()).await {
                GuardOutcome::Continue => {}
                GuardOutcome::Block => {
                    let err = NavigationError::Aborted { source: None };
                    self.abort(generation, &err, hooks);
                    return QueueResult::Stopped(TransitionOutcome::Aborted(err));
                }
                GuardOutcome::Failure(source) => {
                    let err = NavigationError::Aborted {
                        source: Some(source),
                    };
                    self.abort(generation, &err, hooks);
                    return QueueResult::Stopped(TransitionOutcome::Aborted(err));
                }
                GuardOutcome::Redirect(location) => {
                    tracing::debug!(generation, target = ?location, "guard redirected");
                    let mut state = self.lock();
                    if state.pending == Some(generation) {
                        state.pending = None;
                    }
                    drop(state);
                    return QueueResult::Stopped(TransitionOutcome::Redirected {
                        replace: location.wants_replace(),
                        to: location,
                    });
                }
                GuardOutcome::Defer(cb) => match entry.slot {
                    Some((record, view)) => deferred.push((record, view, cb)),
                    None => {
                        tracing::warn!(
                            "deferred callback outside a component enter guard is dropped"
                        );
                    }
                },
            }
        }
        QueueResult::Completed
    }

    fn abort(&self, generation: u64, err: &NavigationError, hooks: &HookSnapshot) {
        let (current, ready_error_cbs) = {
            let mut state = self.lock();
            if state.pending == Some(generation) {
                state.pending = None;
            }
            let cbs = if !state.ready {
                std::mem::take(&mut state.ready_error_cbs)
            } else {
                Vec::new()
            };
            (state.current.clone(), cbs)
        };

        // The address may already show the failed target; snap it back.
        self.ensure_address(&current);

        tracing::debug!(generation, error = %err, "transition aborted");
        for subscriber in &hooks.errors {
            subscriber(err);
        }
        for cb in ready_error_cbs {
            cb(err);
        }
    }

    /// Commit the transition, unless a newer one claimed the engine
    /// after the last guard settled. The claim re-check and the state
    /// mutation share one lock scope, so a commit can never clobber a
    /// newer transition's claim. Returns whether the commit happened.
    #[must_use]
    fn commit(
        &self,
        to: Route,
        from: Route,
        sync: AddressSync,
        generation: u64,
        hooks: &HookSnapshot,
        deferred: Vec<(Arc<RouteRecord>, String, InstanceCallback)>,
    ) -> bool {
        let (listener, ready_cbs) = {
            let mut state = self.lock();
            if state.pending != Some(generation) {
                return false;
            }
            state.current = to.clone();
            state.pending = None;
            let ready_cbs = if !state.ready {
                state.ready = true;
                std::mem::take(&mut state.ready_cbs)
            } else {
                Vec::new()
            };
            (state.listener.clone(), ready_cbs)
        };

        match sync {
            AddressSync::Push => self.backend.push_address(&to.full_path),
            AddressSync::Replace => self.backend.replace_address(&to.full_path),
            AddressSync::Ensure => self.ensure_address(&to),
        }

        tracing::info!(path = %to.full_path, "navigation committed");

        if let Some(listener) = listener {
            listener(&to);
        }
        for hook in &hooks.after {
            hook(&to, &from);
        }
        for cb in ready_cbs {
            cb(&to);
        }

        for (record, view, cb) in deferred {
            self.spawn_instance_poll(to.clone(), record, view, cb);
        }
        true
    }

    /// Correct address drift by replacing the current entry.
    fn ensure_address(&self, route: &Route) {
        if self.backend.location() != route.full_path {
            self.backend.replace_address(&route.full_path);
        }
    }

    /// Wait for the view layer to mount the instance a deferred enter
    /// callback is addressed to. Gives up once the route is left.
    fn spawn_instance_poll(
        &self,
        to: Route,
        record: Arc<RouteRecord>,
        view: String,
        cb: InstanceCallback,
    ) {
        let state = self.state.clone();
        tokio::spawn(async move {
            loop {
                {
                    let state = state.lock().unwrap_or_else(|e| e.into_inner());
                    if !is_same_route(&state.current, &to) {
                        tracing::debug!(
                            path = %record.path,
                            view,
                            "route left before its instance mounted; dropping callback"
                        );
                        return;
                    }
                }
                if let Some(instance) = record.instance(&view) {
                    cb(instance);
                    return;
                }
                tokio::time::sleep(INSTANCE_POLL_INTERVAL).await;
            }
        });
    }
}

/// Split the outgoing and incoming chains at their first divergence.
/// Returns `(updated, deactivated, activated)`: the shared prefix, the
/// outgoing suffix and the incoming suffix.
fn resolve_queue(
    current: &[Arc<RouteRecord>],
    next: &[Arc<RouteRecord>],
) -> (
    Vec<Arc<RouteRecord>>,
    Vec<Arc<RouteRecord>>,
    Vec<Arc<RouteRecord>>,
) {
    let mut i = 0;
    while let (Some(a), Some(b)) = (current.get(i), next.get(i)) {
        if !Arc::ptr_eq(a, b) {
            break;
        }
        i += 1;
    }
    (
        next[..i].to_vec(),
        current[i..].to_vec(),
        next[i..].to_vec(),
    )
}
