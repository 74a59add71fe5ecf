//! # Route Module
//!
//! One registered route: a method set, a compiled path pattern, a handler
//! (single stage or an already-arranged chain), route-local middleware, and
//! free-form metadata.
//!
//! A route's composed dispatcher is built lazily on first use via the
//! pipeline composer and cached for the route's lifetime. Routes are cloned
//! when merged into multiple parent routers; clones copy the method set,
//! metadata, and middleware list by value (the compiled pattern is shared
//! immutably), so one parent's later middleware attachment never leaks into
//! another parent's copy.

mod core;

pub use core::{Handler, MethodSet, Route};
