//! # Router Module
//!
//! The route table: an ordered collection of routes plus a static-path index.
//!
//! ## Two phases
//!
//! A router lives in two phases by contract:
//!
//! 1. **Build**: routes are registered (`add` and the per-method shorthands),
//!    middleware is attached (`use_middleware`), scoped views are opened
//!    (`scope`), and nested routers are merged (`mount`, `mount_under`,
//!    `merge`).
//! 2. **Serve**: `find` resolves a method and path to a route, repeatedly and
//!    concurrently.
//!
//! The first `find` call seals the router; mutating operations afterwards
//! fail with [`RouteError::Sealed`](crate::error::RouteError::Sealed), which
//! turns the "no registration during serving" precondition into an enforced
//! contract.
//!
//! ## Matching
//!
//! Static paths (no parameters, no wildcard) are resolved through an O(1)
//! index keyed by the exact path; everything else is a linear scan over the
//! registration order, first match wins. Registration order is therefore a
//! correctness contract for overlapping dynamic patterns, not an
//! implementation detail.

mod core;
mod scope;

pub use core::{RouteMatch, Router};
pub use scope::Scope;
