//! Path-based address backend.
//!
//! Uses the host's structured address API directly: the full path is
//! the address, prefixed by the configured base.

use std::sync::Arc;

use crate::history::backend::{normalize_base, AddressBackend, HostAddress};
use crate::routing::location::clean_path;

/// Address backend writing real paths through the host address API.
pub struct PathAddress {
    base: String,
    host: Arc<dyn HostAddress>,
}

impl PathAddress {
    pub fn new(host: Arc<dyn HostAddress>, base: Option<&str>) -> Self {
        Self {
            base: normalize_base(base),
            host,
        }
    }
}

impl AddressBackend for PathAddress {
    fn location(&self) -> String {
        let mut path = self.host.read();
        if !self.base.is_empty() && path.len() >= self.base.len() {
            // Byte-wise ASCII-insensitive prefix compare. A non-ASCII
            // byte only matches itself, so the cut stays on a char
            // boundary.
            let (prefix, rest) = path.as_bytes().split_at(self.base.len());
            if prefix.eq_ignore_ascii_case(self.base.as_bytes()) {
                path = String::from_utf8_lossy(rest).into_owned();
            }
        }
        if path.is_empty() {
            "/".to_string()
        } else {
            path
        }
    }

    fn push_address(&self, full_path: &str) {
        self.host.push(&self.make_href(full_path));
    }

    fn replace_address(&self, full_path: &str) {
        self.host.replace(&self.make_href(full_path));
    }

    fn go(&self, delta: i32) -> Option<String> {
        // The host fires an address-change notification; the engine
        // reacts to that instead of transitioning here.
        self.host.go(delta);
        None
    }

    fn make_href(&self, full_path: &str) -> String {
        if self.base.is_empty() {
            full_path.to_string()
        } else {
            clean_path(&format!("{}/{}", self.base, full_path))
        }
    }
}
