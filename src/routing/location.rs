//! Raw locations and their normalization.
//!
//! # Responsibilities
//! - The location types callers hand to `push`/`replace`/`match`
//! - Normalization against the current route: relative paths, appended
//!   segments, params inherited when navigating by bare params
//! - Path/query/fragment parsing and serialization
//!
//! # Design Decisions
//! - Query keys are kept in a `BTreeMap`, so serialization order is
//!   deterministic rather than insertion-ordered
//! - Normalization never fails; an unresolvable location yields an
//!   empty `Location` which matches nothing downstream

use std::collections::{BTreeMap, HashMap};

use crate::routing::route::Route;

/// A location request as supplied by the caller.
#[derive(Debug, Clone)]
pub enum RawLocation {
    /// A path string, possibly relative, with optional query/fragment.
    Path(String),
    /// A structured descriptor (by name or by path).
    Descriptor(LocationDescriptor),
}

/// Structured location descriptor.
#[derive(Debug, Clone, Default)]
pub struct LocationDescriptor {
    /// Navigate to a named route.
    pub name: Option<String>,
    /// Navigate to a path (relative paths resolve against the current
    /// route).
    pub path: Option<String>,
    /// Params for named navigation, or inherited-params navigation
    /// when neither name nor path is given.
    pub params: HashMap<String, String>,
    /// Extra query params; they win over params parsed from `path`.
    pub query: BTreeMap<String, String>,
    /// Fragment; wins over a fragment parsed from `path`.
    pub fragment: Option<String>,
    /// Append to the current path instead of replacing its last
    /// segment.
    pub append: bool,
    /// Replace the current history entry when a guard redirects here.
    pub replace: bool,
}

impl LocationDescriptor {
    /// Descriptor for a named route.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Descriptor for a path.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    pub fn append(mut self) -> Self {
        self.append = true;
        self
    }

    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }
}

impl From<&str> for RawLocation {
    fn from(s: &str) -> Self {
        RawLocation::Path(s.to_string())
    }
}

impl From<String> for RawLocation {
    fn from(s: String) -> Self {
        RawLocation::Path(s)
    }
}

impl From<LocationDescriptor> for RawLocation {
    fn from(d: LocationDescriptor) -> Self {
        RawLocation::Descriptor(d)
    }
}

impl RawLocation {
    /// Whether a guard redirect to this location should replace the
    /// current history entry.
    pub(crate) fn wants_replace(&self) -> bool {
        matches!(self, RawLocation::Descriptor(d) if d.replace)
    }
}

/// A normalized location: either a name or an absolute path, plus the
/// accompanying params, query and fragment.
#[derive(Debug, Clone, Default)]
pub struct Location {
    pub name: Option<String>,
    pub path: Option<String>,
    pub params: HashMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub fragment: Option<String>,
}

/// Normalize a raw location against the current route.
pub fn normalize(raw: &RawLocation, current: Option<&Route>) -> Location {
    match raw {
        RawLocation::Path(s) => {
            let (path, query_str, fragment) = parse_path(s);
            let base = current.map(|c| c.path.as_str()).unwrap_or("/");
            let resolved = if path.is_empty() {
                base.to_string()
            } else {
                resolve_path(&path, base, false)
            };
            Location {
                name: None,
                path: Some(clean_path(&resolved)),
                params: HashMap::new(),
                query: parse_query(&query_str),
                fragment,
            }
        }
        RawLocation::Descriptor(d) => normalize_descriptor(d, current),
    }
}

fn normalize_descriptor(d: &LocationDescriptor, current: Option<&Route>) -> Location {
    if let Some(name) = &d.name {
        return Location {
            name: Some(name.clone()),
            path: None,
            params: d.params.clone(),
            query: d.query.clone(),
            fragment: d.fragment.clone(),
        };
    }

    // Bare params: inherit the current route's identity.
    if d.path.is_none() && !d.params.is_empty() {
        let Some(current) = current else {
            tracing::warn!("params-only navigation requires a current route");
            return Location::default();
        };
        let mut params = current.params.clone();
        params.extend(d.params.clone());

        if let Some(name) = &current.name {
            return Location {
                name: Some(name.clone()),
                path: None,
                params,
                query: d.query.clone(),
                fragment: d.fragment.clone(),
            };
        }
        if let Some(leaf) = current.matched.last() {
            match leaf.pattern.render(&params) {
                Ok(path) => {
                    return Location {
                        name: None,
                        path: Some(path),
                        params,
                        query: d.query.clone(),
                        fragment: d.fragment.clone(),
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "params-only navigation could not render the current path");
                    return Location::default();
                }
            }
        }
        tracing::warn!("params-only navigation with no matched current route");
        return Location::default();
    }

    let raw_path = d.path.clone().unwrap_or_default();
    let (path, query_str, parsed_fragment) = parse_path(&raw_path);
    let base = current.map(|c| c.path.as_str()).unwrap_or("/");
    let resolved = if path.is_empty() {
        base.to_string()
    } else {
        resolve_path(&path, base, d.append)
    };

    let mut query = parse_query(&query_str);
    query.extend(d.query.clone());

    Location {
        name: None,
        path: Some(clean_path(&resolved)),
        params: HashMap::new(),
        query,
        fragment: d.fragment.clone().or(parsed_fragment),
    }
}

/// Split a path string into path, raw query string and fragment.
/// The fragment is split off first so a `?` inside it stays put.
pub fn parse_path(s: &str) -> (String, String, Option<String>) {
    let mut path = s;
    let mut fragment = None;
    if let Some(i) = path.find('#') {
        fragment = Some(path[i + 1..].to_string());
        path = &path[..i];
    }
    let mut query = "";
    if let Some(i) = path.find('?') {
        query = &path[i + 1..];
        path = &path[..i];
    }
    (path.to_string(), query.to_string(), fragment)
}

/// Resolve a possibly-relative path against a base path.
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
    if relative.starts_with('/') {
        return relative.to_string();
    }

    let mut stack: Vec<&str> = base.split('/').collect();
    // Keep the last segment only when appending to a directory-style
    // base (trailing slash).
    if !append || stack.last() == Some(&"") {
        stack.pop();
    }

    for segment in relative.split('/') {
        match segment {
            ".." => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            "." | "" => {}
            _ => stack.push(segment),
        }
    }

    if stack.first() != Some(&"") {
        stack.insert(0, "");
    }
    let joined = stack.join("/");
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// Collapse duplicate slashes.
pub fn clean_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Parse a raw query string into a decoded map. Later duplicates win.
pub fn parse_query(query: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        map.insert(decode(key), decode(value));
    }
    map
}

/// Serialize a query map, empty string when there is nothing to write.
pub fn serialize_query(query: &BTreeMap<String, String>) -> String {
    if query.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = query
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                urlencoding::encode(k).into_owned()
            } else {
                format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))
            }
        })
        .collect();
    format!("?{}", pairs.join("&"))
}

/// Build the fully serialized path: path + query + fragment.
pub fn full_path(path: &str, query: &BTreeMap<String, String>, fragment: Option<&str>) -> String {
    let mut out = String::from(path);
    out.push_str(&serialize_query(query));
    if let Some(f) = fragment {
        out.push('#');
        out.push_str(f);
    }
    out
}

fn decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| s.to_string())
}
