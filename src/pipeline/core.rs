//! Pipeline composition core - the dispatch hot path.

use std::future::Future;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;

/// Opaque stage failure. The core performs no logging, translation, or
/// recovery on these; an application-level error boundary owns that.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed future returned by every stage
pub type StageFuture = BoxFuture<'static, Result<(), BoxError>>;

/// One middleware stage over a context of type `C`.
///
/// Stages are reference-counted closures so that routes, routers, and
/// composed dispatchers can share them without copying.
pub type Stage<C> = Arc<dyn Fn(Arc<C>, Next<C>) -> StageFuture + Send + Sync>;

/// Composition misuse, fatal at dispatch time
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A continuation was invoked more than once at the same or an earlier
    /// stage. This is a bug in a stage, not a normal control-flow outcome,
    /// and it is intended to surface uncaught during development. `stage` is
    /// the ordinal of the stage that repeated the call.
    #[error("next() invoked more than once (stage {stage})")]
    NextCalledMultipleTimes { stage: usize },
}

/// Lift an async closure into a [`Stage`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use corridor::pipeline::{stage_fn, Next, Stage};
///
/// struct Ctx;
///
/// let stage: Stage<Ctx> = stage_fn(|ctx: Arc<Ctx>, next: Next<Ctx>| async move {
///     // code here runs on the way in
///     next.run(Arc::clone(&ctx)).await?;
///     // code here runs on the way out
///     Ok(())
/// });
/// ```
pub fn stage_fn<C, F, Fut>(f: F) -> Stage<C>
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Next<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(move |ctx, next| Box::pin(f(ctx, next)))
}

/// Compose an ordered list of stages into a single [`Dispatcher`].
///
/// An empty list is valid: dispatching it runs only the terminal, or resolves
/// immediately when no terminal is supplied.
#[must_use]
pub fn compose<C>(stages: Vec<Stage<C>>) -> Dispatcher<C> {
    Dispatcher {
        stages: stages.into(),
    }
}

/// A composed pipeline.
///
/// Holds only the immutable stage list; every [`dispatch`](Self::dispatch)
/// invocation creates its own cursor, so a single `Dispatcher` may serve many
/// concurrent dispatches.
pub struct Dispatcher<C> {
    pub(crate) stages: Arc<[Stage<C>]>,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            stages: Arc::clone(&self.stages),
        }
    }
}

impl<C: Send + Sync + 'static> Dispatcher<C> {
    /// Run the pipeline over `ctx`.
    ///
    /// `terminal` is the innermost stage, supplied by the caller: for an HTTP
    /// router it is typically "fall through to the next global middleware" or
    /// a 404 responder. When `terminal` is `None`, an exhausted chain
    /// resolves with no effect.
    pub fn dispatch(&self, ctx: Arc<C>, terminal: Option<Stage<C>>) -> StageFuture {
        let entry = Next {
            stages: Arc::clone(&self.stages),
            terminal,
            // Cursor starts below the first stage; each continuation call
            // must advance it strictly.
            cursor: Arc::new(AtomicIsize::new(-1)),
            index: 0,
        };
        entry.run(ctx)
    }

    /// Number of stages in the composed pipeline
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True iff the pipeline has no stages
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Adapt this pipeline into a single [`Stage`] of an outer pipeline.
    ///
    /// The outer continuation becomes this pipeline's terminal, so an inner
    /// chain that runs to completion falls through to the outer chain -
    /// exactly how a route's composed handler nests inside router-global
    /// middleware.
    #[must_use]
    pub fn as_stage(&self) -> Stage<C> {
        let this = self.clone();
        Arc::new(move |ctx, next| {
            let this = this.clone();
            Box::pin(async move { this.dispatch(ctx, Some(next.as_stage())).await })
        })
    }
}

/// The continuation handed to each stage.
///
/// Carries the stage list, the optional terminal, the per-dispatch cursor,
/// and the ordinal of the stage it will run. `Next` is cheap to clone; the
/// cursor is shared across all clones belonging to one dispatch, which is how
/// repeated continuation calls are detected at runtime.
pub struct Next<C> {
    stages: Arc<[Stage<C>]>,
    terminal: Option<Stage<C>>,
    cursor: Arc<AtomicIsize>,
    index: usize,
}

impl<C> Clone for Next<C> {
    fn clone(&self) -> Self {
        Self {
            stages: Arc::clone(&self.stages),
            terminal: self.terminal.clone(),
            cursor: Arc::clone(&self.cursor),
            index: self.index,
        }
    }
}

impl<C: Send + Sync + 'static> Next<C> {
    /// Hand control to the next stage.
    ///
    /// Awaiting the returned future gives onion ordering: everything nested
    /// below this stage completes (or fails) before the caller's
    /// post-continuation code resumes.
    ///
    /// # Errors
    ///
    /// Fails with [`PipelineError::NextCalledMultipleTimes`] when invoked a
    /// second time at the same or an earlier stage, and otherwise propagates
    /// whatever the downstream stages return.
    pub fn run(&self, ctx: Arc<C>) -> StageFuture {
        let this = self.clone();
        Box::pin(async move {
            let ordinal = this.index as isize;
            let prev = this.cursor.fetch_max(ordinal, Ordering::AcqRel);
            if ordinal <= prev {
                // This continuation belongs to the stage one position back;
                // blame that stage, not the one it was about to run.
                return Err(PipelineError::NextCalledMultipleTimes {
                    stage: this.index.saturating_sub(1),
                }
                .into());
            }

            if this.index < this.stages.len() {
                let stage = Arc::clone(&this.stages[this.index]);
                let next = Next {
                    stages: Arc::clone(&this.stages),
                    terminal: this.terminal.clone(),
                    cursor: Arc::clone(&this.cursor),
                    index: this.index + 1,
                };
                stage(ctx, next).await
            } else if this.index == this.stages.len() {
                match &this.terminal {
                    Some(terminal) => {
                        let next = Next {
                            stages: Arc::clone(&this.stages),
                            terminal: None,
                            cursor: Arc::clone(&this.cursor),
                            index: this.index + 1,
                        };
                        terminal(ctx, next).await
                    }
                    // Exhausted chain with no terminal resolves with no effect.
                    None => Ok(()),
                }
            } else {
                // The terminal's own continuation is inert.
                Ok(())
            }
        })
    }

    /// Adapt this continuation into a [`Stage`], ignoring the inner
    /// continuation it is handed. Used to splice an outer chain in as the
    /// terminal of an inner one.
    #[must_use]
    pub fn as_stage(&self) -> Stage<C> {
        let this = self.clone();
        Arc::new(move |ctx, _next| this.run(ctx))
    }
}
