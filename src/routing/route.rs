//! The resolved navigation target.
//!
//! A `Route` is value-like: transitions replace it wholesale, they
//! never mutate it in place. Chain comparisons are by record identity.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::routing::location::full_path;
use crate::routing::record::RouteRecord;

/// A fully resolved navigation target.
#[derive(Debug, Clone)]
pub struct Route {
    /// Name of the deepest matched record, if any.
    pub name: Option<String>,
    /// Normalized path.
    pub path: String,
    /// Path + serialized query + fragment.
    pub full_path: String,
    /// Params extracted from (or substituted into) the matched path.
    pub params: HashMap<String, String>,
    /// Decoded query map.
    pub query: BTreeMap<String, String>,
    /// Fragment, without the leading `#`.
    pub fragment: Option<String>,
    /// Ancestor chain of the deepest matched record, root first.
    /// Empty for a not-found route.
    pub matched: Vec<Arc<RouteRecord>>,
    /// Full path of the location that redirected here, if any.
    pub redirected_from: Option<String>,
    /// Metadata of the deepest matched record.
    pub meta: serde_json::Value,
}

impl Route {
    /// The initial route, before any navigation has committed.
    pub fn start() -> Self {
        Self {
            name: None,
            path: "/".to_string(),
            full_path: "/".to_string(),
            params: HashMap::new(),
            query: BTreeMap::new(),
            fragment: None,
            matched: Vec::new(),
            redirected_from: None,
            meta: serde_json::Value::Null,
        }
    }

    pub(crate) fn assemble(
        matched: Vec<Arc<RouteRecord>>,
        path: String,
        params: HashMap<String, String>,
        query: BTreeMap<String, String>,
        fragment: Option<String>,
        redirected_from: Option<String>,
    ) -> Self {
        let leaf = matched.last();
        let name = leaf.and_then(|r| r.name.clone());
        let meta = leaf
            .map(|r| r.meta.clone())
            .unwrap_or(serde_json::Value::Null);
        let full_path = full_path(&path, &query, fragment.as_deref());
        Self {
            name,
            path,
            full_path,
            params,
            query,
            fragment,
            matched,
            redirected_from,
            meta,
        }
    }

    /// A route that matched nothing.
    pub(crate) fn not_found(
        path: String,
        query: BTreeMap<String, String>,
        fragment: Option<String>,
        redirected_from: Option<String>,
    ) -> Self {
        Self::assemble(
            Vec::new(),
            path,
            HashMap::new(),
            query,
            fragment,
            redirected_from,
        )
    }
}

/// Structural route comparison, used for duplicate-navigation
/// detection. Chain length is compared separately by the caller so a
/// dynamically appended route map is not mistaken for a duplicate.
pub fn is_same_route(a: &Route, b: &Route) -> bool {
    if !a.path.is_empty() && !b.path.is_empty() {
        return a.path == b.path && a.fragment == b.fragment && a.query == b.query;
    }
    if let (Some(an), Some(bn)) = (&a.name, &b.name) {
        return an == bn
            && a.params == b.params
            && a.fragment == b.fragment
            && a.query == b.query;
    }
    false
}
