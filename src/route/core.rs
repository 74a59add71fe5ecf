//! Route type - method matching, path matching, and the memoized composed
//! dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::pattern::{ParamVec, PathPattern};
use crate::pipeline::{compose, Dispatcher, Stage};

/// The set of HTTP methods a route accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSet {
    /// Accept every method
    Any,
    /// Accept exactly these methods
    Only(Vec<Method>),
}

impl MethodSet {
    /// Exact membership; the HEAD-via-GET rule lives in
    /// [`Route::matches_method`], not here
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        match self {
            MethodSet::Any => true,
            MethodSet::Only(methods) => methods.contains(method),
        }
    }

    /// True iff some method is accepted by both sets. Used for duplicate
    /// detection on static routes: `Any` overlaps everything.
    #[must_use]
    pub fn intersects(&self, other: &MethodSet) -> bool {
        match (self, other) {
            (MethodSet::Any, _) | (_, MethodSet::Any) => true,
            (MethodSet::Only(a), MethodSet::Only(b)) => a.iter().any(|m| b.contains(m)),
        }
    }
}

impl From<Method> for MethodSet {
    fn from(method: Method) -> Self {
        MethodSet::Only(vec![method])
    }
}

impl From<Vec<Method>> for MethodSet {
    fn from(methods: Vec<Method>) -> Self {
        MethodSet::Only(methods)
    }
}

impl From<&[Method]> for MethodSet {
    fn from(methods: &[Method]) -> Self {
        MethodSet::Only(methods.to_vec())
    }
}

impl std::fmt::Display for MethodSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodSet::Any => write!(f, "*"),
            MethodSet::Only(methods) => {
                for (i, m) in methods.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
        }
    }
}

/// A route's handler: one terminal stage, or a chain the caller has already
/// arranged in execution order.
///
/// The variant is explicit so the composer's "is this a chain" branch is a
/// compile-time-checked match rather than runtime shape inspection.
pub enum Handler<C> {
    Single(Stage<C>),
    Chain(Vec<Stage<C>>),
}

impl<C> Handler<C> {
    /// The handler unwrapped into stages in execution order
    pub(crate) fn stages(&self) -> Vec<Stage<C>> {
        match self {
            Handler::Single(stage) => vec![Arc::clone(stage)],
            Handler::Chain(stages) => stages.iter().map(Arc::clone).collect(),
        }
    }
}

impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        match self {
            Handler::Single(stage) => Handler::Single(Arc::clone(stage)),
            Handler::Chain(stages) => Handler::Chain(stages.iter().map(Arc::clone).collect()),
        }
    }
}

impl<C> From<Stage<C>> for Handler<C> {
    fn from(stage: Stage<C>) -> Self {
        Handler::Single(stage)
    }
}

impl<C> From<Vec<Stage<C>>> for Handler<C> {
    fn from(stages: Vec<Stage<C>>) -> Self {
        Handler::Chain(stages)
    }
}

/// One registered route.
///
/// Created by the router at registration time and matched repeatedly during
/// the serve phase. The composed dispatcher is built on first call to
/// [`composed_handler`](Self::composed_handler) and cached; attaching
/// middleware after that point does not rebuild it (documented invariant,
/// not enforced - the router's seal makes the window explicit).
pub struct Route<C> {
    methods: MethodSet,
    pattern: Arc<PathPattern>,
    handler: Handler<C>,
    middleware: Vec<Stage<C>>,
    metadata: HashMap<String, Value>,
    name: String,
    composed: OnceCell<Dispatcher<C>>,
}

impl<C: Send + Sync + 'static> Route<C> {
    pub(crate) fn new(methods: MethodSet, pattern: Arc<PathPattern>, handler: Handler<C>) -> Self {
        let name = pattern.raw().to_string();
        Self {
            methods,
            pattern,
            handler,
            middleware: Vec::new(),
            metadata: HashMap::new(),
            name,
            composed: OnceCell::new(),
        }
    }

    /// Rebind this route to a different compiled pattern, keeping everything
    /// else. Used by nested-router merging, where the full path is recomputed
    /// under the parent's prefix.
    pub(crate) fn with_pattern(&self, pattern: Arc<PathPattern>) -> Self {
        let mut route = self.clone();
        route.pattern = pattern;
        route
    }

    /// Does this route accept `method`?
    ///
    /// True for the wildcard set, for exact membership, and for a HEAD
    /// request against a GET-capable route. The reverse does not hold: a
    /// HEAD-only route never satisfies GET.
    #[must_use]
    pub fn matches_method(&self, method: &Method) -> bool {
        if self.methods.contains(method) {
            return true;
        }
        *method == Method::HEAD && self.methods.contains(&Method::GET)
    }

    /// Match `path` against this route's pattern, appending captured
    /// parameters to `params` on success
    #[must_use]
    pub fn matches_path(&self, path: &str, params: &mut ParamVec) -> bool {
        self.pattern.matches(path, params)
    }

    /// Append one stage to the route-local middleware list.
    ///
    /// May be called repeatedly; order is preserved and calls accumulate.
    /// Has no effect on a dispatcher already built by
    /// [`composed_handler`](Self::composed_handler).
    pub fn middleware(&mut self, stage: Stage<C>) -> &mut Self {
        self.middleware.push(stage);
        self
    }

    /// The composed dispatcher for this route:
    /// `[local middleware..., handler stages...]`.
    ///
    /// Built once, on first call, and cached for the route's lifetime. The
    /// returned value is a cheap handle onto the shared stage list.
    #[must_use]
    pub fn composed_handler(&self) -> Dispatcher<C> {
        self.composed
            .get_or_init(|| {
                let mut stages: Vec<Stage<C>> = self.middleware.iter().map(Arc::clone).collect();
                stages.extend(self.handler.stages());
                compose(stages)
            })
            .clone()
    }

    /// The compiled path pattern
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub(crate) fn pattern_arc(&self) -> &Arc<PathPattern> {
        &self.pattern
    }

    /// The accepted method set
    #[inline]
    #[must_use]
    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    /// Display name; defaults to the path template
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Override the display name
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Attach a free-form metadata entry
    pub fn set_meta(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Look up a metadata entry
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Route-local middleware, in attachment order
    #[must_use]
    pub fn middleware_stack(&self) -> &[Stage<C>] {
        &self.middleware
    }
}

impl<C> std::fmt::Debug for Route<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("methods", &self.methods)
            .field("pattern", &self.pattern.raw())
            .field("name", &self.name)
            .field("middleware_len", &self.middleware.len())
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl<C> Clone for Route<C> {
    /// Independent copy for merging into another parent router.
    ///
    /// The method set, metadata, and middleware list get fresh backing
    /// storage (stages themselves are shared `Arc`s); the compiled pattern is
    /// shared since it is never mutated; the composed-dispatcher cache is
    /// reset so the copy composes against its own middleware list.
    fn clone(&self) -> Self {
        Self {
            methods: self.methods.clone(),
            pattern: Arc::clone(&self.pattern),
            handler: self.handler.clone(),
            middleware: self.middleware.iter().map(Arc::clone).collect(),
            metadata: self.metadata.clone(),
            name: self.name.clone(),
            composed: OnceCell::new(),
        }
    }
}
