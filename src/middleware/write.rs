//! Write-path invalidation middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{response::Parts, Method},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::{buffer_body, without_body, RequestSnapshot};
use crate::cache::{InvalidationPattern, SharedCache};
use crate::error::Result;

/// Computes invalidation patterns from a completed mutation.
pub type PatternFn = Arc<dyn Fn(&RequestSnapshot, &Parts, &Value) -> Vec<String> + Send + Sync>;

#[derive(Clone)]
enum PatternSource {
    Static(Arc<Vec<InvalidationPattern>>),
    Dynamic(PatternFn),
}

// == Invalidation Policy ==
/// State for [`invalidate_on_success`].
#[derive(Clone)]
pub struct InvalidationPolicy {
    cache: SharedCache,
    source: PatternSource,
}

impl InvalidationPolicy {
    /// Invalidates a fixed list of regular expressions.
    ///
    /// Every pattern is compiled up front; the first one that fails is returned
    /// as [`CacheError::InvalidPattern`](crate::error::CacheError::InvalidPattern).
    pub fn patterns<I, S>(cache: SharedCache, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let compiled = patterns
            .into_iter()
            .map(|p| InvalidationPattern::new(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::compiled(cache, compiled))
    }

    /// Invalidates a fixed list of already compiled patterns.
    pub fn compiled(cache: SharedCache, patterns: Vec<InvalidationPattern>) -> Self {
        Self {
            cache,
            source: PatternSource::Static(Arc::new(patterns)),
        }
    }

    /// Computes patterns per request from the request, response head and JSON body.
    ///
    /// The body is `Value::Null` when it is empty or not JSON. Returned strings
    /// that are not valid regular expressions are logged and skipped.
    pub fn dynamic<F>(cache: SharedCache, compute: F) -> Self
    where
        F: Fn(&RequestSnapshot, &Parts, &Value) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            cache,
            source: PatternSource::Dynamic(Arc::new(compute)),
        }
    }
}

// == Middleware ==
/// Invalidates cache entries after a successful (2xx) mutation.
///
/// Besides the configured patterns, the caller's own entries are always
/// dropped when the request carries a caller identity. The response is
/// returned unchanged; a body that fails midway keeps its head and is seen
/// by dynamic patterns as `Value::Null`. GET, HEAD and OPTIONS pass straight
/// through.
pub async fn invalidate_on_success(
    State(policy): State<InvalidationPolicy>,
    request: Request,
    next: Next,
) -> Response {
    if matches!(
        *request.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    ) {
        return next.run(request).await;
    }

    let snapshot = RequestSnapshot::from_request(&request);
    let response = next.run(request).await;

    if !response.status().is_success() {
        return response;
    }

    let (patterns, response) = match &policy.source {
        PatternSource::Static(patterns) => (patterns.to_vec(), response),
        PatternSource::Dynamic(compute) => {
            let (parts, body) = response.into_parts();
            let bytes = match buffer_body(body).await {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    warn!("Response body for {} failed: {}", snapshot.path(), err);
                    None
                }
            };
            let payload = bytes
                .as_deref()
                .and_then(|bytes| serde_json::from_slice(bytes).ok())
                .unwrap_or(Value::Null);
            let patterns = compute(&snapshot, &parts, &payload)
                .iter()
                .filter_map(|source| match InvalidationPattern::new(source) {
                    Ok(pattern) => Some(pattern),
                    Err(err) => {
                        warn!("Ignoring invalidation pattern {:?}: {}", source, err);
                        None
                    }
                })
                .collect::<Vec<_>>();
            let response = match bytes {
                Some(bytes) => Response::from_parts(parts, Body::from(bytes)),
                None => without_body(parts),
            };
            (patterns, response)
        }
    };

    let removed = {
        let mut cache = policy.cache.write().await;
        let mut removed: usize = patterns.iter().map(|p| cache.invalidate(p)).sum();
        if let Some(caller) = &snapshot.caller_id {
            removed += cache.invalidate_caller(caller);
        }
        removed
    };

    debug!(
        "{} {} invalidated {} cached responses",
        snapshot.method,
        snapshot.path(),
        removed
    );

    response
}
