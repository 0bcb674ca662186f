//! Compiled route records.
//!
//! A record is the unit of matching and of guard extraction. Records
//! are immutable after compilation except for two interior slots: the
//! component table (a lazy load caches its resolution there) and the
//! instance table (the view layer registers mounted instances there).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::component::{ComponentRef, ViewInstance};
use crate::config::schema::{PropsSpec, RedirectTarget};
use crate::guards::NavigationGuard;
use crate::routing::pattern::PathPattern;
use crate::routing::route::Route;

/// Arena handle of a record inside its index.
pub type RecordId = usize;

/// View name used when a route declares a single unnamed component.
pub const DEFAULT_VIEW: &str = "default";

/// One compiled route, flattened out of the config tree.
pub struct RouteRecord {
    /// Arena slot inside the owning index.
    pub id: RecordId,
    /// Normalized absolute path (or `*`).
    pub path: String,
    /// Pattern compiled from `path`.
    pub pattern: PathPattern,
    /// Route name, if declared.
    pub name: Option<String>,
    /// Arena slot of the parent record.
    pub parent: Option<RecordId>,
    /// For alias records: the canonical path template this record
    /// resolves through.
    pub match_as: Option<String>,
    /// Redirect target; a redirecting record never renders.
    pub redirect: Option<RedirectTarget>,
    /// Per-record enter guard.
    pub before_enter: Option<NavigationGuard>,
    /// Metadata bag copied from the config.
    pub meta: serde_json::Value,
    /// Per-view prop bindings.
    pub props: BTreeMap<String, PropsSpec>,

    components: RwLock<BTreeMap<String, ComponentRef>>,
    instances: RwLock<BTreeMap<String, Arc<dyn ViewInstance>>>,
}

impl RouteRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: RecordId,
        path: String,
        pattern: PathPattern,
        components: BTreeMap<String, ComponentRef>,
        name: Option<String>,
        parent: Option<RecordId>,
        match_as: Option<String>,
        redirect: Option<RedirectTarget>,
        before_enter: Option<NavigationGuard>,
        meta: serde_json::Value,
        props: BTreeMap<String, PropsSpec>,
    ) -> Self {
        Self {
            id,
            path,
            pattern,
            name,
            parent,
            match_as,
            redirect,
            before_enter,
            meta,
            props,
            components: RwLock::new(components),
            instances: RwLock::new(BTreeMap::new()),
        }
    }

    /// Snapshot of the component table.
    pub fn components(&self) -> BTreeMap<String, ComponentRef> {
        self.components
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace one view's component, typically to cache a resolved
    /// lazy load.
    pub fn set_component(&self, view: &str, component: ComponentRef) {
        self.components
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(view.to_string(), component);
    }

    /// Called by the view layer when it mounts an instance for one of
    /// this record's views.
    pub fn register_instance(&self, view: impl Into<String>, instance: Arc<dyn ViewInstance>) {
        self.instances
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(view.into(), instance);
    }

    /// Called by the view layer when the instance unmounts.
    pub fn deregister_instance(&self, view: &str) {
        self.instances
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(view);
    }

    /// Mounted instance for a view, if any.
    pub fn instance(&self, view: &str) -> Option<Arc<dyn ViewInstance>> {
        self.instances
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(view)
            .cloned()
    }

    /// Snapshot of all mounted instances, in view-name order.
    pub fn instances(&self) -> Vec<(String, Arc<dyn ViewInstance>)> {
        self.instances
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(view, instance)| (view.clone(), instance.clone()))
            .collect()
    }

    /// Props value for one view of this record on the given route.
    pub fn props_for(&self, view: &str, route: &Route) -> serde_json::Value {
        match self.props.get(view) {
            None => serde_json::Value::Null,
            Some(PropsSpec::Params) => {
                let map: serde_json::Map<String, serde_json::Value> = route
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                serde_json::Value::Object(map)
            }
            Some(PropsSpec::Static(value)) => value.clone(),
            Some(PropsSpec::Dynamic(f)) => f(route),
        }
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("match_as", &self.match_as)
            .field("redirect", &self.redirect)
            .finish_non_exhaustive()
    }
}
