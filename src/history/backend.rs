//! Address backend interface.
//!
//! # Responsibilities
//! - Own the serialized address and know how to read and write it
//! - Translate between engine full paths and host hrefs
//!
//! # Design Decisions
//! - Three interchangeable implementations: path-based,
//!   fragment-based, in-memory
//! - `go` returns the target location only for backends that manage
//!   their own stack; host-backed ones delegate and let the host
//!   notify asynchronously

/// The embedding environment's structured address API.
///
/// Path- and fragment-based backends write through this seam; the host
/// is expected to call `Router::handle_address_change` when the
/// address changes underneath the engine (back/forward navigation).
pub trait HostAddress: Send + Sync {
    /// Current href as the host sees it.
    fn read(&self) -> String;
    /// Push a new address entry.
    fn push(&self, href: &str);
    /// Replace the current address entry.
    fn replace(&self, href: &str);
    /// Move through the host's history by a relative delta.
    fn go(&self, delta: i32);
}

/// Uniform entry point the transition machine uses to persist the
/// committed location.
pub trait AddressBackend: Send + Sync {
    /// Current location relative to the base, e.g. `/users/1?tab=a#x`.
    fn location(&self) -> String;

    /// Record a committed navigation as a new entry.
    fn push_address(&self, full_path: &str);

    /// Record a committed navigation in place.
    fn replace_address(&self, full_path: &str);

    /// Move by a relative delta. Returns the location to transition to
    /// when the backend owns its own stack; `None` when the host will
    /// notify asynchronously instead.
    fn go(&self, delta: i32) -> Option<String>;

    /// Href shown to the outside for a full path.
    fn make_href(&self, full_path: &str) -> String;
}

/// Normalize a configured base path: always a leading slash, never a
/// trailing one, empty for the root base.
pub(crate) fn normalize_base(base: Option<&str>) -> String {
    let mut base = match base {
        None | Some("") => return String::new(),
        Some(b) => b.to_string(),
    };
    if !base.starts_with('/') {
        base.insert(0, '/');
    }
    while base.ends_with('/') {
        base.pop();
    }
    base
}
