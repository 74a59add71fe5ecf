//! Registration-time error taxonomy.
//!
//! Everything here is fatal at build time: a malformed template or a
//! conflicting registration means the route table itself is wrong, so these
//! errors are returned from registration calls and never surface during
//! request matching. Dispatch-time composition misuse lives in
//! [`crate::pipeline::PipelineError`]; handler failures are opaque to this
//! crate and propagate unmodified through the pipeline.

use thiserror::Error;

/// Path template compilation error
#[derive(Debug, Error)]
pub enum PatternError {
    /// Every template must be rooted
    #[error("path template must start with '/': `{0}`")]
    MissingLeadingSlash(String),
    /// Only the root template `/` may end with a slash
    #[error("non-root path template must not end with '/': `{0}`")]
    TrailingSlash(String),
    /// A `:` segment with no name can never be read back
    #[error("empty parameter name in path template `{0}`")]
    EmptyParamName(String),
    /// The derived expression failed to compile (should not happen for
    /// templates that pass validation; kept as an error rather than a panic)
    #[error("failed to compile matcher for `{path}`: {source}")]
    Regex {
        path: String,
        #[source]
        source: regex::Error,
    },
}

/// Route registration error
#[derive(Debug, Error)]
pub enum RouteError {
    /// The path template did not compile
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// Prefixes are normalized to `""` or `/p...`; anything else is rejected
    #[error("prefix must start with '/': `{0}`")]
    InvalidPrefix(String),
    /// Two static routes on the same path accept an overlapping method set.
    /// Allowing this would let the static index and the ordered scan list
    /// disagree, so the second registration is rejected outright.
    #[error("duplicate static route: {methods} {path}")]
    DuplicateStatic { methods: String, path: String },
    /// The router is sealed: the first `find` call ends the build phase and
    /// all later mutation is rejected
    #[error("router is sealed; routes cannot be modified after the first lookup")]
    Sealed,
}
