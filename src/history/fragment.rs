//! Fragment-based address backend.
//!
//! Encodes the full serialized path after a `#` delimiter. Decoding
//! must leave the query and any sub-fragment untouched: only the path
//! portion is percent-decoded, since the query was decoded when it was
//! parsed and the sub-fragment belongs to the route.

use std::sync::Arc;

use crate::history::backend::{normalize_base, AddressBackend, HostAddress};
use crate::routing::location::clean_path;

/// Address backend storing the location in the href fragment.
pub struct FragmentAddress {
    base: String,
    host: Arc<dyn HostAddress>,
}

impl FragmentAddress {
    pub fn new(host: Arc<dyn HostAddress>, base: Option<&str>) -> Self {
        Self {
            base: normalize_base(base),
            host,
        }
    }
}

/// Extract the engine location from a full href.
fn extract_fragment(href: &str) -> String {
    let Some(i) = href.find('#') else {
        return String::new();
    };
    let raw = &href[i + 1..];

    let decoded = match raw.find('?') {
        Some(q) => format!("{}{}", decode(&raw[..q]), &raw[q..]),
        None => match raw.find('#') {
            Some(h) => format!("{}{}", decode(&raw[..h]), &raw[h..]),
            None => decode(raw),
        },
    };
    decoded
}

fn decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

impl AddressBackend for FragmentAddress {
    fn location(&self) -> String {
        let fragment = extract_fragment(&self.host.read());
        if fragment.starts_with('/') {
            fragment
        } else {
            format!("/{fragment}")
        }
    }

    fn push_address(&self, full_path: &str) {
        self.host.push(&self.make_href(full_path));
    }

    fn replace_address(&self, full_path: &str) {
        self.host.replace(&self.make_href(full_path));
    }

    fn go(&self, delta: i32) -> Option<String> {
        self.host.go(delta);
        None
    }

    fn make_href(&self, full_path: &str) -> String {
        if self.base.is_empty() {
            format!("#{full_path}")
        } else {
            format!("{}/#{full_path}", clean_path(&self.base))
        }
    }
}
