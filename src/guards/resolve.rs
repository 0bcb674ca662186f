//! Async component resolution.
//!
//! One synthetic queue entry per transition loads every lazy component
//! among the activated records. Loads run concurrently; a pending-count
//! gate (the stream itself) completes the entry only once all of them
//! settle, and the first failure aborts the whole step while later
//! settlements are dropped unseen.

use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::FutureExt;

use crate::component::ComponentRef;
use crate::errors::NavigationError;
use crate::guards::extract::QueueEntry;
use crate::guards::outcome::GuardOutcome;
use crate::routing::record::RouteRecord;

/// Build the synthetic resolver entry, or `None` when nothing among
/// the activated records needs loading.
pub(crate) fn resolver_entry(activated: &[Arc<RouteRecord>]) -> Option<QueueEntry> {
    let mut jobs = Vec::new();
    for record in activated {
        for (view, component) in record.components() {
            if let ComponentRef::Lazy(loader) = component {
                jobs.push((record.clone(), view, loader));
            }
        }
    }
    if jobs.is_empty() {
        return None;
    }

    tracing::debug!(count = jobs.len(), "transition resolves lazy components");
    let jobs = Arc::new(jobs);

    Some(QueueEntry::plain(Arc::new(move |_to, _from| {
        let jobs = jobs.clone();
        async move {
            let mut pending: FuturesUnordered<_> = jobs
                .iter()
                .map(|(record, view, loader)| {
                    let record = record.clone();
                    let view = view.clone();
                    let load = loader();
                    async move { (record, view, load.await) }
                })
                .collect();

            while let Some((record, view, result)) = pending.next().await {
                match result {
                    Ok(component) => {
                        // Cache the resolution so the next navigation
                        // into this record skips the loader.
                        record.set_component(&view, ComponentRef::Ready(component));
                    }
                    Err(err) => {
                        return GuardOutcome::Failure(Box::new(NavigationError::ResolveFailed {
                            view,
                            reason: err.to_string(),
                        }));
                    }
                }
            }
            GuardOutcome::Continue
        }
        .boxed()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ViewComponent;
    use crate::config::schema::RouteConfig;
    use crate::routing::map::RouteIndex;
    use crate::routing::route::Route;

    struct Loaded;
    impl ViewComponent for Loaded {}

    fn lazy_record(ok: bool) -> Arc<RouteRecord> {
        let component = ComponentRef::lazy(move || async move {
            if ok {
                Ok(Arc::new(Loaded) as Arc<dyn ViewComponent>)
            } else {
                Err("network down".into())
            }
        });
        let idx = RouteIndex::compile(&[RouteConfig::new("/lazy").component(component)])
            .expect("compile");
        idx.by_path("/lazy").expect("record").clone()
    }

    #[tokio::test]
    async fn test_successful_resolution_caches_component() {
        let record = lazy_record(true);
        let entry = resolver_entry(&[record.clone()]).expect("entry");

        let outcome = (entry.guard)(Route::start(), Route::start()).await;
        assert!(matches!(outcome, GuardOutcome::Continue));
        assert!(record.components()["default"].is_ready());

        // Fully resolved records no longer produce a resolver entry.
        assert!(resolver_entry(&[record]).is_none());
    }

    #[tokio::test]
    async fn test_failed_resolution_aborts() {
        let record = lazy_record(false);
        let entry = resolver_entry(&[record.clone()]).expect("entry");

        let outcome = (entry.guard)(Route::start(), Route::start()).await;
        let GuardOutcome::Failure(err) = outcome else {
            panic!("expected failure");
        };
        let nav = err.downcast::<NavigationError>().expect("navigation error");
        assert!(matches!(*nav, NavigationError::ResolveFailed { .. }));
        assert!(!record.components()["default"].is_ready());
    }

    #[tokio::test]
    async fn test_ready_components_need_no_resolver() {
        let idx = RouteIndex::compile(&[
            RouteConfig::new("/ready").component(ComponentRef::ready(Loaded))
        ])
        .expect("compile");
        let record = idx.by_path("/ready").expect("record").clone();
        assert!(resolver_entry(&[record]).is_none());
    }
}
