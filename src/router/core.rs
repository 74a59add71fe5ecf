//! Route table core - registration, nested-router merging, and the dual-path
//! find.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use http::Method;
use tracing::{debug, info, warn};

use crate::error::{PatternError, RouteError};
use crate::pattern::{ParamVec, PathPattern};
use crate::pipeline::Stage;
use crate::route::{Handler, MethodSet, Route};

use super::scope::Scope;

/// Result of successfully matching a request to a route.
///
/// Borrows the route from the router (the serve phase never mutates the
/// table) and carries the extracted path parameters.
pub struct RouteMatch<'r, C> {
    /// The matched route
    pub route: &'r Route<C>,
    /// Path parameters in capture order
    pub params: ParamVec,
}

impl<C> RouteMatch<'_, C> {
    /// Get a path parameter by name.
    ///
    /// Last write wins: if the same name occurs at several path depths, the
    /// deepest occurrence is returned.
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Route table over a context of type `C`.
///
/// Ordered routes plus a static-path index. See the [module
/// docs](crate::router) for the build/serve phase contract.
pub struct Router<C> {
    /// All routes in registration order; scan order is match order
    routes: Vec<Route<C>>,
    /// Static full path -> indices into `routes`, in registration order.
    /// Method filtering happens at lookup with the same predicate as the
    /// scan, so the fast and slow paths cannot disagree.
    static_index: HashMap<String, Vec<usize>>,
    /// Normalized prefix: empty, or starts with `/` and does not end with `/`
    prefix: String,
    /// Router-level middleware, applied to every route registered through
    /// this router (retroactively on attach, see `use_middleware`)
    middleware: Vec<Stage<C>>,
    /// Flipped by the first `find`; mutation is rejected afterwards
    sealed: AtomicBool,
}

impl<C: Send + Sync + 'static> Default for Router<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send + Sync + 'static> Router<C> {
    /// Create an empty router with no prefix
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            static_index: HashMap::new(),
            prefix: String::new(),
            middleware: Vec::new(),
            sealed: AtomicBool::new(false),
        }
    }

    /// Create an empty router whose routes are all registered under `prefix`.
    ///
    /// # Errors
    ///
    /// Rejects prefixes that do not start with `/`. The empty string and `/`
    /// both normalize to "no prefix".
    pub fn with_prefix(prefix: &str) -> Result<Self, RouteError> {
        let prefix = normalize_prefix(prefix)?;
        Ok(Self {
            prefix,
            ..Self::new()
        })
    }

    /// The normalized prefix (empty string when none)
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// All routes in registration order
    #[must_use]
    pub fn routes(&self) -> &[Route<C>] {
        &self.routes
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True iff no routes are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Register a route.
    ///
    /// The path is validated (leading `/` required, trailing `/` forbidden
    /// except for the root), prefixed with this router's own prefix, and
    /// compiled. The router's accumulated middleware is appended to the new
    /// route, and static routes are inserted into the O(1) index.
    ///
    /// Returns a handle to the new route for further decoration (local
    /// middleware, name, metadata).
    ///
    /// # Errors
    ///
    /// Fails on malformed paths, on a static registration whose method set
    /// overlaps an existing static route on the same path, and on a sealed
    /// router.
    pub fn add(
        &mut self,
        methods: impl Into<MethodSet>,
        path: &str,
        handler: impl Into<Handler<C>>,
    ) -> Result<&mut Route<C>, RouteError> {
        self.ensure_open()?;
        validate_route_path(path)?;

        let full = join_paths(&self.prefix, path);
        let pattern = Arc::new(PathPattern::compile(&full)?);
        let mut route = Route::new(methods.into(), pattern, handler.into());
        for stage in &self.middleware {
            route.middleware(Arc::clone(stage));
        }
        self.push_route(route)
    }

    /// Register a `GET` route
    pub fn get(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::GET, path, Handler::Single(stage))
    }

    /// Register a `POST` route
    pub fn post(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::POST, path, Handler::Single(stage))
    }

    /// Register a `PUT` route
    pub fn put(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::PUT, path, Handler::Single(stage))
    }

    /// Register a `DELETE` route
    pub fn delete(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::DELETE, path, Handler::Single(stage))
    }

    /// Register a `PATCH` route
    pub fn patch(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::PATCH, path, Handler::Single(stage))
    }

    /// Register a `HEAD` route
    pub fn head(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::HEAD, path, Handler::Single(stage))
    }

    /// Register an `OPTIONS` route
    pub fn options(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::OPTIONS, path, Handler::Single(stage))
    }

    /// Register a route accepting every method
    pub fn any(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(MethodSet::Any, path, Handler::Single(stage))
    }

    /// Attach router-level middleware.
    ///
    /// The stage is appended to this router's list (so every future route
    /// receives it at registration) and retroactively appended to every
    /// already-registered route's local middleware. Attaching never silently
    /// skips existing routes.
    ///
    /// # Errors
    ///
    /// Fails on a sealed router.
    pub fn use_middleware(&mut self, stage: Stage<C>) -> Result<&mut Self, RouteError> {
        self.ensure_open()?;
        for route in &mut self.routes {
            route.middleware(Arc::clone(&stage));
        }
        self.middleware.push(stage);
        debug!(
            retrofitted = self.routes.len(),
            "router middleware attached"
        );
        Ok(self)
    }

    /// Open a scoped view that registers routes under an additional prefix
    /// and with its own middleware list.
    ///
    /// The scope holds no routes of its own; it forwards to this router.
    ///
    /// # Errors
    ///
    /// Rejects prefixes that do not start with `/`, and a sealed router.
    pub fn scope(&mut self, prefix: &str) -> Result<Scope<'_, C>, RouteError> {
        self.ensure_open()?;
        let prefix = normalize_prefix(prefix)?;
        Ok(Scope::new(self, prefix))
    }

    /// Merge all of `child`'s routes into this router, re-prefixed under this
    /// router's own prefix.
    ///
    /// Each merged route is an independent clone (no shared mutable state
    /// with the child post-merge); its full path becomes
    /// `self.prefix + child route path`, with a trailing slash stripped
    /// unless the result is the root. The child router is left unmodified.
    ///
    /// # Errors
    ///
    /// Fails on static-route conflicts and on a sealed router.
    pub fn mount(&mut self, child: &Router<C>) -> Result<(), RouteError> {
        let prefix = self.prefix.clone();
        self.mount_with_prefix(&prefix, child)
    }

    /// Merge all of `child`'s routes, with `prefix` playing the outer-prefix
    /// role instead of this router's own.
    ///
    /// # Errors
    ///
    /// As [`mount`](Self::mount), plus prefix validation.
    pub fn mount_under(&mut self, prefix: &str, child: &Router<C>) -> Result<(), RouteError> {
        let prefix = normalize_prefix(prefix)?;
        self.mount_with_prefix(&prefix, child)
    }

    /// Merge all of `child`'s routes verbatim, with no re-prefixing.
    ///
    /// For callers that have already arranged the child's paths correctly.
    ///
    /// # Errors
    ///
    /// Fails on static-route conflicts and on a sealed router.
    pub fn merge(&mut self, child: &Router<C>) -> Result<(), RouteError> {
        self.ensure_open()?;
        for route in &child.routes {
            self.push_route(route.clone())?;
        }
        info!(merged = child.routes.len(), "router merged verbatim");
        Ok(())
    }

    fn mount_with_prefix(&mut self, prefix: &str, child: &Router<C>) -> Result<(), RouteError> {
        self.ensure_open()?;
        for route in &child.routes {
            let full = join_paths(prefix, route.pattern().raw());
            let clone = if full == route.pattern().raw() {
                // Same full path; the compiled pattern is immutable and can
                // be shared.
                route.with_pattern(Arc::clone(route.pattern_arc()))
            } else {
                route.with_pattern(Arc::new(PathPattern::compile(&full)?))
            };
            self.push_route(clone)?;
        }
        info!(
            merged = child.routes.len(),
            prefix = %prefix,
            "nested router merged"
        );
        Ok(())
    }

    /// Resolve a method and path to a route.
    ///
    /// The first call seals the router. The path is normalized by stripping
    /// exactly one trailing slash (unless it is the root `/`; a double slash
    /// is deliberately not normalized). Static paths resolve through the
    /// O(1) index; everything else scans the registration order and the first
    /// route whose method set and pattern both accept the request wins.
    ///
    /// `None` is a normal outcome (the caller's 404 or fallback chain), not
    /// an error.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, C>> {
        self.sealed.store(true, Ordering::Release);
        let path = normalize_request_path(path);
        debug!(method = %method, path = %path, "route match attempt");

        if let Some(indices) = self.static_index.get(path) {
            for &i in indices {
                let route = &self.routes[i];
                if route.matches_method(method) {
                    debug!(
                        method = %method,
                        path = %path,
                        route = %route.name(),
                        "static index hit"
                    );
                    return Some(RouteMatch {
                        route,
                        params: ParamVec::new(),
                    });
                }
            }
        }

        if let Some(found) = self.scan(method, path) {
            debug!(
                method = %method,
                path = %path,
                route = %found.route.name(),
                pattern = %found.route.pattern().raw(),
                "route matched"
            );
            return Some(found);
        }

        warn!(method = %method, path = %path, "no route matched");
        None
    }

    /// Linear scan in registration order. `find` falls back to this when the
    /// static index misses; tests call it directly to check fast/slow path
    /// consistency.
    fn scan(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, C>> {
        for route in &self.routes {
            if !route.matches_method(method) {
                continue;
            }
            let mut params = ParamVec::new();
            if route.matches_path(path, &mut params) {
                return Some(RouteMatch { route, params });
            }
        }
        None
    }

    /// Append a built route, indexing it when static and rejecting static
    /// duplicates
    fn push_route(&mut self, route: Route<C>) -> Result<&mut Route<C>, RouteError> {
        if route.pattern().is_static() {
            let key = route.pattern().raw().to_string();
            if let Some(indices) = self.static_index.get(&key) {
                for &i in indices {
                    if self.routes[i].methods().intersects(route.methods()) {
                        return Err(RouteError::DuplicateStatic {
                            methods: route.methods().to_string(),
                            path: key,
                        });
                    }
                }
            }
            self.static_index
                .entry(key)
                .or_default()
                .push(self.routes.len());
        }

        debug!(
            methods = %route.methods(),
            path = %route.pattern().raw(),
            is_static = route.pattern().is_static(),
            "route registered"
        );
        self.routes.push(route);
        let idx = self.routes.len() - 1;
        Ok(&mut self.routes[idx])
    }

    fn ensure_open(&self) -> Result<(), RouteError> {
        if self.sealed.load(Ordering::Acquire) {
            return Err(RouteError::Sealed);
        }
        Ok(())
    }
}

/// Normalize a prefix: empty or `/` mean none; otherwise it must start with
/// `/` and any trailing slashes are stripped
pub(crate) fn normalize_prefix(prefix: &str) -> Result<String, RouteError> {
    if prefix.is_empty() || prefix == "/" {
        return Ok(String::new());
    }
    if !prefix.starts_with('/') {
        return Err(RouteError::InvalidPrefix(prefix.to_string()));
    }
    Ok(prefix.trim_end_matches('/').to_string())
}

/// Registration-time validation of a caller-supplied route path.
///
/// Runs before the prefix join; a bad path must not become accidentally
/// valid through concatenation.
pub(crate) fn validate_route_path(path: &str) -> Result<(), RouteError> {
    if !path.starts_with('/') {
        return Err(PatternError::MissingLeadingSlash(path.to_string()).into());
    }
    if path.len() > 1 && path.ends_with('/') {
        return Err(PatternError::TrailingSlash(path.to_string()).into());
    }
    Ok(())
}

/// Concatenate a normalized prefix and a rooted path, stripping a trailing
/// slash unless the result is the root
pub(crate) fn join_paths(prefix: &str, path: &str) -> String {
    let mut full = String::with_capacity(prefix.len() + path.len());
    full.push_str(prefix);
    full.push_str(path);
    if full.len() > 1 && full.ends_with('/') {
        full.pop();
    }
    if full.is_empty() {
        full.push('/');
    }
    full
}

/// Strip exactly one trailing slash unless the path is the root
fn normalize_request_path(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{stage_fn, Next};

    struct Ctx;

    fn handler() -> Stage<Ctx> {
        stage_fn(|ctx: Arc<Ctx>, next: Next<Ctx>| async move { next.run(ctx).await })
    }

    #[test]
    fn test_static_index_and_scan_agree() {
        let mut router: Router<Ctx> = Router::new();
        router.get("/zoo/animals", handler()).unwrap();
        router.post("/zoo/animals", handler()).unwrap();
        router.get("/zoo/animals/:id", handler()).unwrap();
        router.get("/zoo/health", handler()).unwrap();

        for (method, path) in [
            (Method::GET, "/zoo/animals"),
            (Method::POST, "/zoo/animals"),
            (Method::GET, "/zoo/health"),
            (Method::HEAD, "/zoo/health"),
        ] {
            let via_find = router.find(&method, path).expect("find failed");
            let via_scan = router.scan(&method, path).expect("scan failed");
            assert!(
                std::ptr::eq(via_find.route, via_scan.route),
                "fast and slow path disagree for {method} {path}"
            );
        }
    }

    #[test]
    fn test_static_index_precedes_earlier_dynamic_route() {
        // The O(1) index is consulted before the ordered scan, so a static
        // route wins over a dynamic route registered earlier that would also
        // match. This is the point of the fast path.
        let mut router: Router<Ctx> = Router::new();
        router
            .get("/users/:id", handler())
            .unwrap()
            .set_name("dynamic");
        router.get("/users/me", handler()).unwrap().set_name("me");

        let found = router.find(&Method::GET, "/users/me").unwrap();
        assert_eq!(found.route.name(), "me");
    }

    #[test]
    fn test_duplicate_static_rejected() {
        let mut router: Router<Ctx> = Router::new();
        router.get("/items", handler()).unwrap();

        let err = router.get("/items", handler()).unwrap_err();
        assert!(matches!(err, RouteError::DuplicateStatic { .. }));

        // Disjoint methods on the same static path are fine.
        router.post("/items", handler()).unwrap();

        // A wildcard-method route overlaps every existing registration.
        let err = router.any("/items", handler()).unwrap_err();
        assert!(matches!(err, RouteError::DuplicateStatic { .. }));
    }

    #[test]
    fn test_head_fallback_respects_registration_order() {
        // A GET route registered before a HEAD route wins HEAD requests in
        // the scan; the static index must agree.
        let mut router: Router<Ctx> = Router::new();
        router.get("/health", handler()).unwrap().set_name("get");
        router.head("/health", handler()).unwrap().set_name("head");

        let via_find = router.find(&Method::HEAD, "/health").unwrap();
        let via_scan = router.scan(&Method::HEAD, "/health").unwrap();
        assert_eq!(via_find.route.name(), "get");
        assert!(std::ptr::eq(via_find.route, via_scan.route));
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("", "/"), "/");
        assert_eq!(join_paths("/api", "/"), "/api");
        assert_eq!(join_paths("/api", "/users"), "/api/users");
        assert_eq!(join_paths("", "/users"), "/users");
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("").unwrap(), "");
        assert_eq!(normalize_prefix("/").unwrap(), "");
        assert_eq!(normalize_prefix("/api").unwrap(), "/api");
        assert_eq!(normalize_prefix("/api/").unwrap(), "/api");
        assert!(matches!(
            normalize_prefix("api"),
            Err(RouteError::InvalidPrefix(_))
        ));
    }
}
