//! Location matcher.
//!
//! # Responsibilities
//! - Resolve a raw location plus the current route into a matched
//!   `Route`
//! - Follow record redirects (with a depth limit) and alias
//!   cross-links
//! - Merge dynamically added routes without disturbing record identity
//!
//! # Design Decisions
//! - Matching never fails: an unmatched location yields a route with
//!   an empty chain, keeping navigation idempotent
//! - First match wins over the ordered path list; registration order
//!   is the only tie-break
//! - The compiled index sits behind `ArcSwap` so `add_routes` is an
//!   atomic swap while in-flight matches keep their snapshot

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::{RedirectTarget, RouteConfig};
use crate::errors::ConfigError;
use crate::routing::location::{self, full_path, parse_path, Location, RawLocation};
use crate::routing::map::RouteIndex;
use crate::routing::pattern::{PathPattern, PatternOptions};
use crate::routing::record::RouteRecord;
use crate::routing::route::Route;

/// A redirect chain longer than this is treated as not-found instead
/// of looping.
pub(crate) const MAX_REDIRECT_DEPTH: usize = 10;

/// Resolves locations against the compiled route index.
pub struct Matcher {
    index: ArcSwap<RouteIndex>,
}

impl Matcher {
    /// Compile the initial route set.
    pub fn new(routes: &[RouteConfig]) -> Result<Self, ConfigError> {
        let index = RouteIndex::compile(routes)?;
        Ok(Self {
            index: ArcSwap::from_pointee(index),
        })
    }

    /// Merge additional routes and swap the new index in atomically.
    pub fn add_routes(&self, routes: &[RouteConfig]) -> Result<(), ConfigError> {
        let merged = self.index.load().with_routes(routes)?;
        self.index.store(Arc::new(merged));
        Ok(())
    }

    /// Resolve a raw location into a matched route.
    pub fn match_location(&self, raw: &RawLocation, current: Option<&Route>) -> Route {
        let index = self.index.load_full();
        self.match_inner(&index, raw, current, None, 0)
    }

    fn match_inner(
        &self,
        index: &RouteIndex,
        raw: &RawLocation,
        current: Option<&Route>,
        redirected_from: Option<String>,
        depth: usize,
    ) -> Route {
        let loc = location::normalize(raw, current);

        if let Some(name) = loc.name.clone() {
            return self.match_by_name(index, &name, loc, current, redirected_from, depth);
        }
        if loc.path.is_some() {
            return self.match_by_path(index, loc, redirected_from, depth);
        }
        Route::not_found("/".to_string(), loc.query, loc.fragment, redirected_from)
    }

    fn match_by_name(
        &self,
        index: &RouteIndex,
        name: &str,
        loc: Location,
        current: Option<&Route>,
        redirected_from: Option<String>,
        depth: usize,
    ) -> Route {
        let Some(record) = index.by_name(name) else {
            tracing::warn!(name, "no route matched the given name");
            return Route::not_found("/".to_string(), loc.query, loc.fragment, redirected_from);
        };
        let record = record.clone();

        // Unspecified required params are inherited from the current
        // route.
        let mut params = loc.params;
        if let Some(current) = current {
            for key in record.pattern.param_names() {
                if !params.contains_key(key) {
                    if let Some(value) = current.params.get(key) {
                        params.insert(key.to_string(), value.clone());
                    }
                }
            }
        }

        match record.pattern.render(&params) {
            Ok(path) => self.create_route(
                index,
                &record,
                path,
                params,
                loc.query,
                loc.fragment,
                redirected_from,
                depth,
            ),
            Err(err) => {
                tracing::warn!(name, error = %err, "could not render path for named route");
                Route::not_found("/".to_string(), loc.query, loc.fragment, redirected_from)
            }
        }
    }

    fn match_by_path(
        &self,
        index: &RouteIndex,
        loc: Location,
        redirected_from: Option<String>,
        depth: usize,
    ) -> Route {
        let path = loc.path.unwrap_or_default();

        for candidate in index.path_list() {
            let Some(record) = index.by_path(candidate) else {
                continue;
            };
            if let Some(params) = record.pattern.matches(&path) {
                let record = record.clone();
                return self.create_route(
                    index,
                    &record,
                    path,
                    params,
                    loc.query,
                    loc.fragment,
                    redirected_from,
                    depth,
                );
            }
        }

        Route::not_found(path, loc.query, loc.fragment, redirected_from)
    }

    /// Build the final route for a matched record, following redirect
    /// and alias indirection first.
    #[allow(clippy::too_many_arguments)]
    fn create_route(
        &self,
        index: &RouteIndex,
        record: &Arc<RouteRecord>,
        path: String,
        params: HashMap<String, String>,
        query: BTreeMap<String, String>,
        fragment: Option<String>,
        redirected_from: Option<String>,
        depth: usize,
    ) -> Route {
        if record.redirect.is_some() {
            return self.follow_redirect(index, record, path, params, query, fragment, depth);
        }
        if let Some(match_as) = record.match_as.clone() {
            return self.follow_alias(
                index,
                &match_as,
                path,
                params,
                query,
                fragment,
                redirected_from,
                depth,
            );
        }
        Route::assemble(
            index.ancestor_chain(record),
            path,
            params,
            query,
            fragment,
            redirected_from,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn follow_redirect(
        &self,
        index: &RouteIndex,
        record: &Arc<RouteRecord>,
        path: String,
        params: HashMap<String, String>,
        query: BTreeMap<String, String>,
        fragment: Option<String>,
        depth: usize,
    ) -> Route {
        if depth >= MAX_REDIRECT_DEPTH {
            tracing::warn!(
                path = %record.path,
                "redirect chain exceeded {MAX_REDIRECT_DEPTH} hops; treating as not found"
            );
            return Route::not_found(path, query, fragment, None);
        }

        let origin = full_path(&path, &query, fragment.as_deref());

        let target = match record.redirect.as_ref() {
            None => return Route::not_found(path, query, fragment, None),
            Some(RedirectTarget::Location(loc)) => loc.clone(),
            Some(RedirectTarget::Dynamic(f)) => {
                // Dynamic targets see the route as matched at the
                // redirecting record.
                let here = Route::assemble(
                    index.ancestor_chain(record),
                    path.clone(),
                    params.clone(),
                    query.clone(),
                    fragment.clone(),
                    None,
                );
                f(&here)
            }
        };

        // The original request's params, query and fragment carry over
        // unless the target specifies its own.
        let raw = match target {
            RawLocation::Path(s) => {
                let (template, _, _) = parse_path(&s);
                let pattern = PathPattern::compile(&template, PatternOptions::default());
                match pattern.render(&params) {
                    Ok(filled) => {
                        let mut d = location::LocationDescriptor::path(filled);
                        d.query = query.clone();
                        d.fragment = fragment.clone();
                        RawLocation::Descriptor(d)
                    }
                    Err(err) => {
                        tracing::warn!(target = %s, error = %err, "could not fill redirect target params");
                        return Route::not_found(path, query, fragment, None);
                    }
                }
            }
            RawLocation::Descriptor(mut d) => {
                if d.name.is_none() && d.path.is_none() {
                    tracing::warn!(path = %record.path, "invalid redirect target: neither path nor name");
                    return Route::not_found(path, query, fragment, None);
                }
                let mut merged = params.clone();
                merged.extend(d.params);
                d.params = merged;
                if d.query.is_empty() {
                    d.query = query.clone();
                }
                if d.fragment.is_none() {
                    d.fragment = fragment.clone();
                }
                RawLocation::Descriptor(d)
            }
        };

        self.match_inner(index, &raw, None, Some(origin), depth + 1)
    }

    #[allow(clippy::too_many_arguments)]
    fn follow_alias(
        &self,
        index: &RouteIndex,
        match_as: &str,
        path: String,
        params: HashMap<String, String>,
        query: BTreeMap<String, String>,
        fragment: Option<String>,
        redirected_from: Option<String>,
        depth: usize,
    ) -> Route {
        let pattern = PathPattern::compile(match_as, PatternOptions::default());
        let canonical_path = match pattern.render(&params) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(match_as, error = %err, "could not derive canonical path for alias");
                return Route::not_found(path, query, fragment, redirected_from);
            }
        };

        let canonical = self.match_inner(
            index,
            &RawLocation::Path(canonical_path),
            None,
            None,
            depth + 1,
        );

        // The chain and params come from the canonical record; the
        // externally visible path stays the alias that was navigated.
        if !canonical.matched.is_empty() {
            return Route::assemble(
                canonical.matched,
                path,
                canonical.params,
                query,
                fragment,
                redirected_from,
            );
        }
        Route::not_found(path, query, fragment, redirected_from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::location::LocationDescriptor;

    fn matcher(routes: Vec<RouteConfig>) -> Matcher {
        Matcher::new(&routes).expect("compile")
    }

    #[test]
    fn test_sibling_param_match() {
        let m = matcher(vec![
            RouteConfig::new("/a").named("A"),
            RouteConfig::new("/a/:id").named("B"),
        ]);
        let route = m.match_location(&"/a/5".into(), None);
        assert_eq!(route.params["id"], "5");
        assert_eq!(route.matched.len(), 1);
        assert_eq!(route.name.as_deref(), Some("B"));
    }

    #[test]
    fn test_match_is_idempotent() {
        let m = matcher(vec![RouteConfig::new("/u/:id")]);
        let a = m.match_location(&"/u/9?x=1#f".into(), None);
        let b = m.match_location(&"/u/9?x=1#f".into(), None);
        assert_eq!(a.full_path, b.full_path);
        assert_eq!(a.params, b.params);
        assert_eq!(a.matched.len(), b.matched.len());
        for (ra, rb) in a.matched.iter().zip(&b.matched) {
            assert!(Arc::ptr_eq(ra, rb));
        }
    }

    #[test]
    fn test_unmatched_yields_empty_chain() {
        let m = matcher(vec![RouteConfig::new("/known")]);
        let route = m.match_location(&"/unknown".into(), None);
        assert!(route.matched.is_empty());
        assert_eq!(route.path, "/unknown");
    }

    #[test]
    fn test_wildcard_matches_last() {
        let m = matcher(vec![
            RouteConfig::new("*").named("fallback"),
            RouteConfig::new("/real"),
        ]);
        let route = m.match_location(&"/real".into(), None);
        assert_eq!(route.name, None);
        assert_eq!(route.matched[0].path, "/real");

        let route = m.match_location(&"/other".into(), None);
        assert_eq!(route.name.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_named_match_fills_params_from_current() {
        let m = matcher(vec![RouteConfig::new("/u/:id").named("user")]);
        let current = m.match_location(&"/u/42".into(), None);

        let raw = RawLocation::from(LocationDescriptor::named("user"));
        let route = m.match_location(&raw, Some(&current));
        assert_eq!(route.path, "/u/42");
        assert_eq!(route.params["id"], "42");
    }

    #[test]
    fn test_named_miss_is_not_found() {
        let m = matcher(vec![RouteConfig::new("/x").named("x")]);
        let raw = RawLocation::from(LocationDescriptor::named("nope"));
        let route = m.match_location(&raw, None);
        assert!(route.matched.is_empty());
    }

    #[test]
    fn test_alias_resolves_to_canonical_chain() {
        let m = matcher(vec![RouteConfig::new("/x").named("x").alias("/y")]);
        let canonical = m.match_location(&"/x".into(), None);
        let via_alias = m.match_location(&"/y".into(), None);

        assert_eq!(via_alias.path, "/y");
        assert_eq!(via_alias.matched.len(), canonical.matched.len());
        for (a, c) in via_alias.matched.iter().zip(&canonical.matched) {
            assert!(Arc::ptr_eq(a, c));
        }
    }

    #[test]
    fn test_alias_with_params() {
        let m = matcher(vec![RouteConfig::new("/u/:id").alias("/people/:id")]);
        let route = m.match_location(&"/people/3".into(), None);
        assert_eq!(route.path, "/people/3");
        assert_eq!(route.params["id"], "3");
        assert_eq!(route.matched.last().expect("leaf").path, "/u/:id");
    }

    #[test]
    fn test_literal_redirect() {
        let m = matcher(vec![
            RouteConfig::new("/old").redirect("/new"),
            RouteConfig::new("/new").named("new"),
        ]);
        let route = m.match_location(&"/old?keep=1".into(), None);
        assert_eq!(route.path, "/new");
        assert_eq!(route.query["keep"], "1");
        assert_eq!(route.redirected_from.as_deref(), Some("/old?keep=1"));
    }

    #[test]
    fn test_redirect_with_param_template() {
        let m = matcher(vec![
            RouteConfig::new("/legacy/:id").redirect("/users/:id"),
            RouteConfig::new("/users/:id"),
        ]);
        let route = m.match_location(&"/legacy/8".into(), None);
        assert_eq!(route.path, "/users/8");
        assert_eq!(route.params["id"], "8");
    }

    #[test]
    fn test_dynamic_redirect() {
        let m = matcher(vec![
            RouteConfig::new("/from/:id").redirect_fn(|route| {
                RawLocation::Path(format!("/to/{}", route.params["id"]))
            }),
            RouteConfig::new("/to/:id"),
        ]);
        let route = m.match_location(&"/from/5".into(), None);
        assert_eq!(route.path, "/to/5");
    }

    #[test]
    fn test_redirect_cycle_is_not_found() {
        let m = matcher(vec![
            RouteConfig::new("/ping").redirect("/pong"),
            RouteConfig::new("/pong").redirect("/ping"),
        ]);
        let route = m.match_location(&"/ping".into(), None);
        assert!(route.matched.is_empty());
    }

    #[test]
    fn test_add_routes_makes_new_paths_matchable() {
        let m = matcher(vec![RouteConfig::new("/a")]);
        assert!(m.match_location(&"/b".into(), None).matched.is_empty());

        m.add_routes(&[RouteConfig::new("/b")]).expect("add_routes");
        assert!(!m.match_location(&"/b".into(), None).matched.is_empty());
    }

    #[test]
    fn test_nested_match_builds_full_chain() {
        let m = matcher(vec![RouteConfig::new("/p").child(RouteConfig::new(":id"))]);
        let route = m.match_location(&"/p/7".into(), None);
        let paths: Vec<&str> = route.matched.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["/p", "/p/:id"]);
        assert_eq!(route.params["id"], "7");
    }
}
