//! # Pipeline Module
//!
//! Generic onion-model middleware composition.
//!
//! [`compose`] turns an ordered list of stages into a single [`Dispatcher`].
//! Each stage receives the shared context and a [`Next`] continuation; code
//! before `next.run(...)` executes on the way in (outer to inner), code after
//! it executes on the way out (inner to outer). A stage may decline to call
//! its continuation to short-circuit, and any error it returns propagates
//! unmodified to whoever awaited the dispatch.
//!
//! The composer is context-agnostic: the HTTP router composes stages over a
//! request context, and a command-line executor can compose the same way over
//! a completely different context shape.
//!
//! Every dispatch gets a fresh cursor, so one composed pipeline can be
//! dispatched many times concurrently without cross-talk. Calling a
//! continuation twice at the same stage is a programmer error and fails
//! loudly with [`PipelineError::NextCalledMultipleTimes`].

mod core;

pub use core::{compose, stage_fn, BoxError, Dispatcher, Next, PipelineError, Stage, StageFuture};
