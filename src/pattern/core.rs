//! Path template compilation - registration-time work that keeps the match
//! path cheap.

use std::sync::Arc;

use regex::Regex;
use smallvec::SmallVec;

use crate::error::PatternError;

/// Maximum number of path parameters before heap allocation.
/// Most REST-style paths have ≤4 params (e.g., `/users/:id/posts/:post_id`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match path.
///
/// Parameter names use `Arc<str>` because they come from the compiled pattern
/// (known at registration time) and `Arc::clone()` is an O(1) refcount bump.
/// Values remain `String` as they are per-request data sliced from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A compiled path template.
///
/// Holds the raw template string, the anchored regex derived from it, the
/// ordered parameter names, and the static/dynamic classification. Patterns
/// are immutable after construction and are shared between cloned routes via
/// `Arc` without copying.
///
/// # Template syntax
///
/// - `:name` (a whole segment) captures one segment: `[A-Za-z0-9._-]+`,
///   never crossing a `/`.
/// - `*` (a whole segment) captures greedily across segments, including `/`.
///   The captured value is recorded under the parameter name `*`.
/// - Any other segment matches literally (regex metacharacters escaped).
///
/// # Example
///
/// ```
/// use corridor::pattern::{ParamVec, PathPattern};
///
/// let pattern = PathPattern::compile("/users/:id").unwrap();
/// assert!(!pattern.is_static());
///
/// let mut params = ParamVec::new();
/// assert!(pattern.matches("/users/42", &mut params));
/// assert_eq!(params[0].1, "42");
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The raw template exactly as registered
    raw: String,
    /// Anchored regex with one capture group per parameter
    regex: Regex,
    /// Parameter names in capture-group order
    params: Vec<Arc<str>>,
    /// True iff the template has no `:name` and no `*` tokens
    is_static: bool,
}

impl PathPattern {
    /// Compile a path template.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when the template does not start with `/`,
    /// when a non-root template ends with `/`, or when a `:` segment carries
    /// no name. These are registration errors; a running router never sees a
    /// pattern that failed to compile.
    pub fn compile(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }
        if raw.len() > 1 && raw.ends_with('/') {
            return Err(PatternError::TrailingSlash(raw.to_string()));
        }

        let mut expr = String::with_capacity(raw.len() + 8);
        expr.push('^');
        let mut params: Vec<Arc<str>> = Vec::new();
        let mut is_static = true;

        // `raw` starts with '/', so the first split element is empty and
        // every subsequent element is one segment.
        for segment in raw.split('/').skip(1) {
            expr.push('/');
            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternError::EmptyParamName(raw.to_string()));
                }
                expr.push_str("([A-Za-z0-9._-]+)");
                params.push(Arc::from(name));
                is_static = false;
            } else if segment == "*" {
                expr.push_str("(.*)");
                params.push(Arc::from("*"));
                is_static = false;
            } else {
                expr.push_str(&regex::escape(segment));
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|source| PatternError::Regex {
            path: raw.to_string(),
            source,
        })?;

        Ok(Self {
            raw: raw.to_string(),
            regex,
            params,
            is_static,
        })
    }

    /// The raw template exactly as registered
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True iff the template contains no parameters and no wildcard
    #[inline]
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Parameter names in capture-group order
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.params
    }

    /// Match a request path against this pattern.
    ///
    /// Exact string equality with the raw template short-circuits to true
    /// without touching the regex (fast path for static patterns, and a
    /// deliberate defensive behavior for dynamic ones). Otherwise the
    /// compiled regex runs; on success every captured value is appended to
    /// `params` in declaration order.
    ///
    /// Captured values are not URL-decoded here; decoding belongs to the
    /// HTTP-context collaborator.
    #[must_use]
    pub fn matches(&self, path: &str, params: &mut ParamVec) -> bool {
        if path == self.raw {
            return true;
        }
        let Some(caps) = self.regex.captures(path) else {
            return false;
        };
        for (i, name) in self.params.iter().enumerate() {
            if let Some(value) = caps.get(i + 1) {
                params.push((Arc::clone(name), value.as_str().to_string()));
            }
        }
        true
    }
}
