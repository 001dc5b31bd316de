//! Read-path caching middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::HeaderName, response::Parts, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::{buffer_body, without_body, RequestSnapshot};
use crate::cache::SharedCache;

/// `HIT` or `MISS`.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
/// Cache key used for the request.
pub const X_CACHE_KEY: HeaderName = HeaderName::from_static("x-cache-key");
/// TTL in seconds the response was stored with; present only when stored.
pub const X_CACHE_TTL: HeaderName = HeaderName::from_static("x-cache-ttl");

/// Decides whether a successful response may be cached.
pub type ShouldCache = Arc<dyn Fn(&RequestSnapshot, &Parts, &Value) -> bool + Send + Sync>;

// == Cache Policy ==
/// State for [`cache_response`].
#[derive(Clone)]
pub struct CachePolicy {
    cache: SharedCache,
    ttl: Option<u64>,
    should_cache: Option<ShouldCache>,
}

impl CachePolicy {
    /// Caches every successful JSON response for the store's default TTL.
    pub fn new(cache: SharedCache) -> Self {
        Self {
            cache,
            ttl: None,
            should_cache: None,
        }
    }

    /// Overrides the TTL for responses stored through this policy.
    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl = Some(ttl_seconds);
        self
    }

    /// Only caches responses for which `predicate` returns true.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestSnapshot, &Parts, &Value) -> bool + Send + Sync + 'static,
    {
        self.should_cache = Some(Arc::new(predicate));
        self
    }
}

// == Middleware ==
/// Serves GET requests from the cache, storing successful JSON responses on a miss.
///
/// Hits answer `200` with the cached payload without calling the handler.
/// Both hits and misses carry `x-cache` and `x-cache-key`; a stored miss also
/// carries `x-cache-ttl`. Other methods pass straight through.
///
/// A miss whose fetch overlapped an invalidation is served but not stored.
pub async fn cache_response(
    State(policy): State<CachePolicy>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let snapshot = RequestSnapshot::from_request(&request);
    let key = snapshot.cache_key();

    let (cached, generation) = {
        let mut cache = policy.cache.write().await;
        (cache.get(&key), cache.generation())
    };
    if let Some(value) = cached {
        debug!("Cache HIT {}", key);
        let mut response = Json(value).into_response();
        mark(&mut response, "HIT", &key);
        return response;
    }

    debug!("Cache MISS {}", key);
    let mut response = next.run(request).await;
    mark(&mut response, "MISS", &key);

    if !response.status().is_success() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match buffer_body(body).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("Not caching {}: response body failed: {}", key, err);
            return without_body(parts);
        }
    };

    let payload = match serde_json::from_slice::<Value>(&bytes) {
        Ok(payload) => payload,
        Err(_) => {
            debug!("Not caching {}: body is not JSON", key);
            return Response::from_parts(parts, Body::from(bytes));
        }
    };

    let accepted = policy
        .should_cache
        .as_ref()
        .map_or(true, |predicate| predicate(&snapshot, &parts, &payload));
    if !accepted {
        debug!("Not caching {}: rejected by predicate", key);
        return Response::from_parts(parts, Body::from(bytes));
    }

    let stored = {
        let mut cache = policy.cache.write().await;
        if cache.generation() != generation {
            debug!("Not caching {}: invalidated while fetching", key);
            None
        } else {
            let ttl = policy.ttl.unwrap_or_else(|| cache.default_ttl());
            cache.set(key.clone(), payload, Some(ttl)).then_some(ttl)
        }
    };

    if let Some(ttl) = stored {
        debug!("Cached {} for {}s", key, ttl);
        parts.headers.insert(X_CACHE_TTL, HeaderValue::from(ttl));
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// Attaches the cache status and key headers.
fn mark(response: &mut Response, status: &'static str, key: &str) {
    let headers = response.headers_mut();
    headers.insert(X_CACHE, HeaderValue::from_static(status));
    // JSON quoting escapes control characters except DEL, which headers reject.
    if let Ok(value) = HeaderValue::from_str(key) {
        headers.insert(X_CACHE_KEY, value);
    }
}
