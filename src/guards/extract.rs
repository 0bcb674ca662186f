//! Guard extraction from matched records.
//!
//! # Responsibilities
//! - Pull lifecycle hooks off matched components and instances
//! - Bind each guard to the right receiver and order the list
//!
//! # Design Decisions
//! - Leave guards run child to parent; update and enter guards run
//!   parent to child
//! - Leave/update hooks live on instances: a never-mounted view has no
//!   entry in the instances map, so its guard is simply omitted
//! - Hook invocation is deferred to execution time, so user code only
//!   runs when its queue position is reached

use std::sync::Arc;

use futures_util::future::ready;
use futures_util::FutureExt;

use crate::component::ComponentRef;
use crate::guards::outcome::{GuardOutcome, NavigationGuard};
use crate::routing::record::RouteRecord;

/// One entry of a transition's guard queue.
pub(crate) struct QueueEntry {
    pub guard: NavigationGuard,
    /// Record and view name, attached to component enter guards so a
    /// deferred callback can later be routed to the mounted instance.
    pub slot: Option<(Arc<RouteRecord>, String)>,
}

impl QueueEntry {
    pub(crate) fn plain(guard: NavigationGuard) -> Self {
        Self { guard, slot: None }
    }
}

fn continue_now() -> crate::guards::GuardFuture {
    ready(GuardOutcome::Continue).boxed()
}

/// Leave guards of deactivated records, deepest first, bound to their
/// mounted instances.
pub(crate) fn leave_guards(deactivated: &[Arc<RouteRecord>]) -> Vec<QueueEntry> {
    let mut entries = Vec::new();
    for record in deactivated.iter().rev() {
        for (_, instance) in record.instances() {
            entries.push(QueueEntry::plain(Arc::new(move |to, from| {
                instance
                    .before_route_leave(to, from)
                    .unwrap_or_else(continue_now)
            })));
        }
    }
    entries
}

/// Update guards of reused records, root first, bound to their mounted
/// instances.
pub(crate) fn update_guards(updated: &[Arc<RouteRecord>]) -> Vec<QueueEntry> {
    let mut entries = Vec::new();
    for record in updated {
        for (_, instance) in record.instances() {
            entries.push(QueueEntry::plain(Arc::new(move |to, from| {
                instance
                    .before_route_update(to, from)
                    .unwrap_or_else(continue_now)
            })));
        }
    }
    entries
}

/// Component enter guards of activated records, in chain order. Runs
/// after async components have resolved, so every reference is ready.
pub(crate) fn enter_guards(activated: &[Arc<RouteRecord>]) -> Vec<QueueEntry> {
    let mut entries = Vec::new();
    for record in activated {
        for (view, component) in record.components() {
            let ComponentRef::Ready(component) = component else {
                continue;
            };
            let slot = Some((record.clone(), view));
            entries.push(QueueEntry {
                guard: Arc::new(move |to, from| {
                    component
                        .before_route_enter(to, from)
                        .unwrap_or_else(continue_now)
                }),
                slot,
            });
        }
    }
    entries
}
