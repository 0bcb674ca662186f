//! Route map compiler.
//!
//! # Responsibilities
//! - Depth-first compilation of the config tree into three flat
//!   indexes: ordered path list, path → record map, name → record map
//! - Alias synthesis (`match_as` cross-link to the canonical path)
//! - Incremental merge for dynamically added routes
//!
//! # Design Decisions
//! - Arena storage: records are `Arc`s in a flat vec, parent links are
//!   integer handles, so the record graph has no ownership cycles
//! - First write wins for a duplicate path; the later duplicate is
//!   ignored for matching but its name still claims the name map
//! - Bare-wildcard paths are stable-partitioned to the end of the path
//!   list so they never shadow concrete routes

use std::collections::HashMap;
use std::sync::Arc;

use crate::component::ComponentRef;
use crate::config::schema::RouteConfig;
use crate::errors::ConfigError;
use crate::routing::location::clean_path;
use crate::routing::pattern::{PathPattern, PatternOptions};
use crate::routing::record::{RecordId, RouteRecord};

/// The compiled flat indexes over a route configuration tree.
#[derive(Debug, Default)]
pub struct RouteIndex {
    records: Vec<Arc<RouteRecord>>,
    path_list: Vec<String>,
    path_map: HashMap<String, RecordId>,
    name_map: HashMap<String, RecordId>,
}

impl RouteIndex {
    /// Compile a route configuration tree.
    pub fn compile(routes: &[RouteConfig]) -> Result<Self, ConfigError> {
        let mut index = Self::default();
        index.add_all(routes)?;
        Ok(index)
    }

    /// Build a new index with additional routes merged in. Existing
    /// records keep their identity (`Arc`) and their arena slots.
    pub fn with_routes(&self, routes: &[RouteConfig]) -> Result<Self, ConfigError> {
        let mut index = Self {
            records: self.records.clone(),
            path_list: self.path_list.clone(),
            path_map: self.path_map.clone(),
            name_map: self.name_map.clone(),
        };
        index.add_all(routes)?;
        Ok(index)
    }

    fn add_all(&mut self, routes: &[RouteConfig]) -> Result<(), ConfigError> {
        for route in routes {
            self.add_route_record(route, None, None)?;
        }

        // Wildcard routes must never shadow concrete ones, regardless
        // of registration order.
        let (concrete, wildcard): (Vec<String>, Vec<String>) =
            self.path_list.drain(..).partition(|p| p != "*");
        self.path_list = concrete;
        self.path_list.extend(wildcard);

        let missing_slash: Vec<&str> = self
            .path_list
            .iter()
            .filter(|p| !p.is_empty() && !p.starts_with('/') && !p.starts_with('*'))
            .map(|p| p.as_str())
            .collect();
        if !missing_slash.is_empty() {
            tracing::warn!(
                paths = ?missing_slash,
                "non-nested routes must include a leading slash"
            );
        }

        Ok(())
    }

    fn add_route_record(
        &mut self,
        route: &RouteConfig,
        parent: Option<RecordId>,
        match_as: Option<String>,
    ) -> Result<(), ConfigError> {
        let Some(path) = &route.path else {
            return Err(ConfigError::MissingPath {
                name: route.name.clone().unwrap_or_else(|| "<unnamed>".into()),
            });
        };

        for component in route.components.values() {
            if let ComponentRef::Named(id) = component {
                return Err(ConfigError::ComponentByName {
                    path: path.clone(),
                    id: id.clone(),
                });
            }
        }

        let options = PatternOptions {
            case_sensitive: route.case_sensitive.unwrap_or(false),
            strict: route.strict.unwrap_or(false),
        };
        let parent_path = parent.map(|id| self.records[id].path.clone());
        let normalized = normalize_path(path, parent_path.as_deref(), options.strict);
        let pattern = PathPattern::compile(&normalized, options);

        let id = self.records.len();
        let record = Arc::new(RouteRecord::new(
            id,
            normalized.clone(),
            pattern,
            route.components.clone(),
            route.name.clone(),
            parent,
            match_as.clone(),
            route.redirect.clone(),
            route.before_enter.clone(),
            route.meta.clone(),
            route.props.clone(),
        ));
        self.records.push(record);

        for child in &route.children {
            let child_match_as = match_as.as_ref().map(|m| {
                let child_path = child.path.as_deref().unwrap_or("");
                clean_path(&format!("{m}/{child_path}"))
            });
            self.add_route_record(child, Some(id), child_match_as)?;
        }

        // First write wins; a later duplicate path is ignored for
        // matching but may still claim the name map below.
        if !self.path_map.contains_key(&normalized) {
            self.path_list.push(normalized.clone());
            self.path_map.insert(normalized.clone(), id);
        }

        for alias in &route.alias {
            if alias == path {
                tracing::warn!(
                    alias,
                    "alias has the same value as its path and will be ignored"
                );
                continue;
            }
            let alias_route = RouteConfig {
                path: Some(alias.clone()),
                children: route.children.clone(),
                ..Default::default()
            };
            let canonical = if normalized.is_empty() {
                "/".to_string()
            } else {
                normalized.clone()
            };
            self.add_route_record(&alias_route, parent, Some(canonical))?;
        }

        if let Some(name) = &route.name {
            if !self.name_map.contains_key(name) {
                self.name_map.insert(name.clone(), id);
            } else if match_as.is_none() {
                tracing::warn!(
                    name,
                    path = %normalized,
                    "duplicate named routes definition; the first registration wins"
                );
            }
        }

        Ok(())
    }

    /// Record registered under a normalized path.
    pub fn by_path(&self, path: &str) -> Option<&Arc<RouteRecord>> {
        self.path_map.get(path).map(|id| &self.records[*id])
    }

    /// Record claimed under a name.
    pub fn by_name(&self, name: &str) -> Option<&Arc<RouteRecord>> {
        self.name_map.get(name).map(|id| &self.records[*id])
    }

    /// Paths in match order (wildcards last).
    pub fn path_list(&self) -> &[String] {
        &self.path_list
    }

    /// Record by arena slot.
    pub fn record(&self, id: RecordId) -> Option<&Arc<RouteRecord>> {
        self.records.get(id)
    }

    /// Root-to-leaf ancestor chain of a record.
    pub fn ancestor_chain(&self, record: &Arc<RouteRecord>) -> Vec<Arc<RouteRecord>> {
        let mut chain = vec![record.clone()];
        let mut parent = record.parent;
        while let Some(id) = parent {
            let p = &self.records[id];
            chain.push(p.clone());
            parent = p.parent;
        }
        chain.reverse();
        chain
    }
}

/// Normalize a config path against its parent.
fn normalize_path(path: &str, parent: Option<&str>, strict: bool) -> String {
    let mut path = path.to_string();
    if !strict && path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    if path.starts_with('/') {
        return path;
    }
    match parent {
        None => path,
        Some(parent) => clean_path(&format!("{parent}/{path}")),
    }
}
