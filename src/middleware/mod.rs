//! Middleware Module
//!
//! axum middleware that puts the response cache in front of handlers.
//!
//! # Layers
//! - [`cache_response`]: serves GET requests from the cache and stores successful JSON responses
//! - [`invalidate_on_success`]: drops matching cache entries after a successful mutation
//! - [`identify_caller`]: turns the `x-user-id` header into a [`CallerId`] extension

mod caller;
mod read;
mod write;

use axum::{
    body::{Body, Bytes},
    extract::{OriginalUri, Query, Request},
    http::{header::CONTENT_LENGTH, response::Parts, HeaderMap, Method, Uri},
    response::Response,
};

use crate::cache::derive_key;

pub use caller::{identify_caller, CallerId, CALLER_HEADER};
pub use read::{cache_response, CachePolicy, ShouldCache, X_CACHE, X_CACHE_KEY, X_CACHE_TTL};
pub use write::{invalidate_on_success, InvalidationPolicy, PatternFn};

// == Request Snapshot ==
/// The parts of a request the cache needs after the request has been handed downstream.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    /// HTTP method
    pub method: Method,
    /// Full request URI as received, before any router nesting strips a prefix
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Caller identity, if an upstream layer attached one
    pub caller_id: Option<String>,
}

impl RequestSnapshot {
    /// Captures method, URI, headers and caller identity from a request.
    pub fn from_request(request: &Request) -> Self {
        let uri = request
            .extensions()
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.clone())
            .unwrap_or_else(|| request.uri().clone());

        Self {
            method: request.method().clone(),
            uri,
            headers: request.headers().clone(),
            caller_id: request
                .extensions()
                .get::<CallerId>()
                .map(|CallerId(id)| id.clone()),
        }
    }

    /// Path including the query string.
    pub fn path(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    /// Path plus query string with parameters stably sorted by name.
    ///
    /// Repeated parameters keep their relative order, so `?b=2&a=1&a=0`
    /// becomes `?a=1&a=0&b=2`. The raw encoding of each parameter is kept.
    pub fn canonical_path(&self) -> String {
        let path = self.uri.path();
        let mut params: Vec<&str> = match self.uri.query() {
            Some(query) => query.split('&').filter(|p| !p.is_empty()).collect(),
            None => Vec::new(),
        };
        if params.is_empty() {
            return path.to_string();
        }
        params.sort_by(|a, b| param_name(a).cmp(param_name(b)));
        format!("{}?{}", path, params.join("&"))
    }

    /// Decoded query parameters in arrival order. A malformed query string yields none.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        Query::<Vec<(String, String)>>::try_from_uri(&self.uri)
            .map(|Query(pairs)| pairs)
            .unwrap_or_default()
    }

    /// Cache key identifying this request.
    pub fn cache_key(&self) -> String {
        derive_key(
            self.method.as_str(),
            &self.canonical_path(),
            &self.query_pairs(),
            self.caller_id.as_deref(),
        )
    }
}

fn param_name(param: &str) -> &str {
    param.split_once('=').map_or(param, |(name, _)| name)
}

/// Collects a response body so it can be inspected and sent again.
async fn buffer_body(body: Body) -> Result<Bytes, axum::Error> {
    axum::body::to_bytes(body, usize::MAX).await
}

/// Rebuilds a response whose body failed midway, keeping the downstream head.
fn without_body(mut parts: Parts) -> Response {
    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::empty())
}
