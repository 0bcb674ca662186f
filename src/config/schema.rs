//! Route configuration schema definitions.
//!
//! The config tree is read-only to the engine: compilation walks it and
//! produces records, but never mutates or retains the configs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::component::ComponentRef;
use crate::guards::NavigationGuard;
use crate::routing::location::RawLocation;
use crate::routing::record::DEFAULT_VIEW;
use crate::routing::route::Route;

/// Where a redirecting record sends the navigation.
#[derive(Clone)]
pub enum RedirectTarget {
    /// A literal location.
    Location(RawLocation),
    /// A function of the route that matched the redirecting record.
    Dynamic(Arc<dyn Fn(&Route) -> RawLocation + Send + Sync>),
}

impl fmt::Debug for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectTarget::Location(loc) => write!(f, "RedirectTarget::Location({loc:?})"),
            RedirectTarget::Dynamic(_) => f.write_str("RedirectTarget::Dynamic(..)"),
        }
    }
}

/// How props are derived for one view of a matched record.
#[derive(Clone)]
pub enum PropsSpec {
    /// Pass the route params as props.
    Params,
    /// A fixed value.
    Static(serde_json::Value),
    /// Computed from the matched route.
    Dynamic(Arc<dyn Fn(&Route) -> serde_json::Value + Send + Sync>),
}

impl fmt::Debug for PropsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropsSpec::Params => f.write_str("PropsSpec::Params"),
            PropsSpec::Static(v) => write!(f, "PropsSpec::Static({v})"),
            PropsSpec::Dynamic(_) => f.write_str("PropsSpec::Dynamic(..)"),
        }
    }
}

/// One node of the declarative route tree.
///
/// Supplied by the host application; read-only to the engine.
#[derive(Clone, Default)]
pub struct RouteConfig {
    /// Route path. Required; relative paths concatenate with the
    /// parent's normalized path.
    pub path: Option<String>,

    /// Optional route name for named-location lookup.
    pub name: Option<String>,

    /// View-name → component reference.
    pub components: BTreeMap<String, ComponentRef>,

    /// Nested child routes.
    pub children: Vec<RouteConfig>,

    /// Redirect target; a redirecting record never renders.
    pub redirect: Option<RedirectTarget>,

    /// Additional paths that resolve to this record's component chain.
    pub alias: Vec<String>,

    /// Per-record enter guard.
    pub before_enter: Option<NavigationGuard>,

    /// Arbitrary metadata bag.
    pub meta: serde_json::Value,

    /// Per-view prop bindings.
    pub props: BTreeMap<String, PropsSpec>,

    /// Static segments match exactly rather than case-insensitively.
    pub case_sensitive: Option<bool>,

    /// Trailing slashes are significant for this path.
    pub strict: Option<bool>,
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("components", &self.components)
            .field("children", &self.children)
            .field("redirect", &self.redirect)
            .field("alias", &self.alias)
            .field("before_enter", &self.before_enter.as_ref().map(|_| ".."))
            .field("meta", &self.meta)
            .field("case_sensitive", &self.case_sensitive)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

impl RouteConfig {
    /// Start a config for the given path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            meta: serde_json::Value::Null,
            ..Default::default()
        }
    }

    /// Name this route.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the component for the default view.
    pub fn component(self, component: ComponentRef) -> Self {
        self.view(DEFAULT_VIEW, component)
    }

    /// Set the component for a named view.
    pub fn view(mut self, view: impl Into<String>, component: ComponentRef) -> Self {
        self.components.insert(view.into(), component);
        self
    }

    /// Append a child route.
    pub fn child(mut self, child: RouteConfig) -> Self {
        self.children.push(child);
        self
    }

    /// Redirect to a literal location.
    pub fn redirect(mut self, to: impl Into<RawLocation>) -> Self {
        self.redirect = Some(RedirectTarget::Location(to.into()));
        self
    }

    /// Redirect computed from the matched route.
    pub fn redirect_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Route) -> RawLocation + Send + Sync + 'static,
    {
        self.redirect = Some(RedirectTarget::Dynamic(Arc::new(f)));
        self
    }

    /// Add an alias path.
    pub fn alias(mut self, path: impl Into<String>) -> Self {
        self.alias.push(path.into());
        self
    }

    /// Attach a per-record enter guard.
    pub fn before_enter(mut self, guard: NavigationGuard) -> Self {
        self.before_enter = Some(guard);
        self
    }

    /// Attach metadata.
    pub fn meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = meta;
        self
    }

    /// Bind props for the default view.
    pub fn props(mut self, spec: PropsSpec) -> Self {
        self.props.insert(DEFAULT_VIEW.to_string(), spec);
        self
    }

    /// Bind props for a named view.
    pub fn props_for(mut self, view: impl Into<String>, spec: PropsSpec) -> Self {
        self.props.insert(view.into(), spec);
        self
    }

    /// Make static segments case-sensitive.
    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = Some(yes);
        self
    }

    /// Make trailing slashes significant.
    pub fn strict(mut self, yes: bool) -> Self {
        self.strict = Some(yes);
        self
    }
}
