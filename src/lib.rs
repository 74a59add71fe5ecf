//! # Corridor
//!
//! **Corridor** is a request-dispatch core: a route table that maps a method
//! and path to a handler, plus a generic asynchronous middleware pipeline
//! that wraps handler execution in nested ("onion") layers.
//!
//! ## Overview
//!
//! The crate is organized into four modules, leaves first:
//!
//! - **[`pattern`]** - path template compilation (`/users/:id`, `/files/*`)
//!   into anchored regex matchers with a static/dynamic classification
//! - **[`route`]** - one registered route: method set, compiled pattern,
//!   handler or handler chain, local middleware, metadata, and a memoized
//!   composed dispatcher
//! - **[`router`]** - the route table: ordered routes with first-match-wins
//!   scanning, an O(1) static-path index, prefix scoping, retroactive
//!   middleware attachment, and nested-router merging
//! - **[`pipeline`]** - the onion-model composer: `compose(stages)` yields a
//!   dispatcher that threads a shared context and a `next` continuation
//!   through every stage, with strict call-once-per-stage discipline
//!
//! The core is deliberately transport-free. It consumes an opaque context
//! type `C` (your HTTP context, your CLI command context, anything
//! `Send + Sync`) and exposes `find` plus composed dispatchers; sockets,
//! header parsing, rendering, and persistence belong to the collaborators
//! that plug into it.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use http::Method;
//! use corridor::pipeline::{stage_fn, Next};
//! use corridor::router::Router;
//!
//! // Any Send + Sync type works as the context.
//! struct Ctx {
//!     hits: std::sync::atomic::AtomicUsize,
//! }
//!
//! # fn main() -> Result<(), corridor::error::RouteError> {
//! let mut router: Router<Ctx> = Router::new();
//! router.get(
//!     "/users/:id",
//!     stage_fn(|ctx: Arc<Ctx>, _next: Next<Ctx>| async move {
//!         ctx.hits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
//!         Ok(())
//!     }),
//! )?;
//!
//! let found = router.find(&Method::GET, "/users/42").expect("no match");
//! assert_eq!(found.get_param("id"), Some("42"));
//!
//! // The composed dispatcher runs route middleware around the handler.
//! let _dispatcher = found.route.composed_handler();
//! # Ok(())
//! # }
//! ```
//!
//! ## Build and serve phases
//!
//! Registration (`add`, `use_middleware`, `scope`, `mount`) and serving
//! (`find`, dispatch) are distinct phases: the first `find` seals the router
//! and later mutation fails with [`error::RouteError::Sealed`]. One composed
//! pipeline may be dispatched many times concurrently; every dispatch gets
//! its own cursor.
//!
//! ## What this crate does not do
//!
//! No cancellation or timeout mechanism exists in the pipeline: a stage that
//! never calls its continuation and never returns stalls that dispatch
//! indefinitely. Wrap stages in your runtime's timeout primitive if you need
//! a bound.

pub mod error;
pub mod pattern;
pub mod pipeline;
pub mod route;
pub mod router;

pub use error::{PatternError, RouteError};
pub use pattern::{ParamVec, PathPattern, MAX_INLINE_PARAMS};
pub use pipeline::{compose, stage_fn, BoxError, Dispatcher, Next, PipelineError, Stage};
pub use route::{Handler, MethodSet, Route};
pub use router::{RouteMatch, Router, Scope};
