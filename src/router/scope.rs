//! Scoped registration view - prefix grouping with its own middleware list.

use std::sync::Arc;

use http::Method;

use crate::error::RouteError;
use crate::pipeline::Stage;
use crate::route::{Handler, MethodSet, Route};

use super::core::{join_paths, normalize_prefix, validate_route_path, Router};

/// A lightweight view onto a parent [`Router`] that registers routes under
/// an additional prefix and decorates them with its own middleware.
///
/// A scope holds no route collection: every `add` is forwarded to the parent
/// after the prefixes are concatenated, and the scope's middleware list is
/// appended to each route it creates. Scopes nest.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use corridor::pipeline::{stage_fn, Next};
/// use corridor::router::Router;
///
/// struct Ctx;
///
/// let handler = stage_fn(|ctx: Arc<Ctx>, next: Next<Ctx>| async move { next.run(ctx).await });
///
/// let mut router: Router<Ctx> = Router::new();
/// let mut admin = router.scope("/admin").unwrap();
/// admin.get("/settings", handler).unwrap();
///
/// assert_eq!(router.routes()[0].pattern().raw(), "/admin/settings");
/// ```
pub struct Scope<'r, C> {
    router: &'r mut Router<C>,
    prefix: String,
    middleware: Vec<Stage<C>>,
}

impl<'r, C: Send + Sync + 'static> Scope<'r, C> {
    pub(super) fn new(router: &'r mut Router<C>, prefix: String) -> Self {
        Self {
            router,
            prefix,
            middleware: Vec::new(),
        }
    }

    /// The scope's own prefix (relative to the parent router's)
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Append middleware to this scope.
    ///
    /// Applies to routes registered through the scope from this point on;
    /// the parent router and sibling scopes are unaffected.
    pub fn use_middleware(&mut self, stage: Stage<C>) -> &mut Self {
        self.middleware.push(stage);
        self
    }

    /// Register a route under the scope's prefix.
    ///
    /// # Errors
    ///
    /// As [`Router::add`]. The caller-supplied path is validated before the
    /// prefix join; a malformed path must not become accidentally valid
    /// through concatenation.
    pub fn add(
        &mut self,
        methods: impl Into<MethodSet>,
        path: &str,
        handler: impl Into<Handler<C>>,
    ) -> Result<&mut Route<C>, RouteError> {
        validate_route_path(path)?;
        let full = join_paths(&self.prefix, path);
        let route = self.router.add(methods, &full, handler)?;
        for stage in &self.middleware {
            route.middleware(Arc::clone(stage));
        }
        Ok(route)
    }

    /// Register a `GET` route under the scope's prefix
    pub fn get(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::GET, path, Handler::Single(stage))
    }

    /// Register a `POST` route under the scope's prefix
    pub fn post(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::POST, path, Handler::Single(stage))
    }

    /// Register a `PUT` route under the scope's prefix
    pub fn put(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::PUT, path, Handler::Single(stage))
    }

    /// Register a `DELETE` route under the scope's prefix
    pub fn delete(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::DELETE, path, Handler::Single(stage))
    }

    /// Register a `PATCH` route under the scope's prefix
    pub fn patch(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::PATCH, path, Handler::Single(stage))
    }

    /// Register a `HEAD` route under the scope's prefix
    pub fn head(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::HEAD, path, Handler::Single(stage))
    }

    /// Register an `OPTIONS` route under the scope's prefix
    pub fn options(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(Method::OPTIONS, path, Handler::Single(stage))
    }

    /// Register a route accepting every method under the scope's prefix
    pub fn any(&mut self, path: &str, stage: Stage<C>) -> Result<&mut Route<C>, RouteError> {
        self.add(MethodSet::Any, path, Handler::Single(stage))
    }

    /// Open a nested scope; prefixes concatenate and this scope's middleware
    /// is inherited as the starting list.
    ///
    /// # Errors
    ///
    /// Rejects prefixes that do not start with `/`.
    pub fn scope(&mut self, prefix: &str) -> Result<Scope<'_, C>, RouteError> {
        let child_prefix = normalize_prefix(prefix)?;
        // Both parts are normalized ("" or "/p"), so plain concatenation
        // stays normalized.
        let mut combined = self.prefix.clone();
        combined.push_str(&child_prefix);
        let mut nested = Scope::new(&mut *self.router, combined);
        nested.middleware = self.middleware.iter().map(Arc::clone).collect();
        Ok(nested)
    }
}
