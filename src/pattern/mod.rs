//! # Pattern Module
//!
//! Path template compilation for the route table.
//!
//! A path template such as `/users/:id/posts/:post_id` is compiled once, at
//! registration time, into a [`PathPattern`]: an anchored regex, the ordered
//! list of parameter names, and a static/dynamic classification. Static
//! templates (no `:name` segments, no `*` segment) are eligible for the
//! router's O(1) index; dynamic templates are matched by regex during the
//! linear scan.
//!
//! Compilation is pure and deterministic: the same template always yields an
//! equivalent matcher, so match behavior is reproducible across runs.

mod core;

pub use core::{ParamVec, PathPattern, MAX_INLINE_PARAMS};
