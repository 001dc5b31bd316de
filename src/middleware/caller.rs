//! Caller identity extraction.

use axum::{extract::Request, middleware::Next, response::Response};

/// Header carrying the caller identity.
pub const CALLER_HEADER: &str = "x-user-id";

/// Opaque caller identity attached to a request as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

/// Copies a non-empty `x-user-id` header into a [`CallerId`] extension.
///
/// Requests without the header, or with a blank or non-UTF-8 value, are left
/// anonymous.
pub async fn identify_caller(mut request: Request, next: Next) -> Response {
    let caller = request
        .headers()
        .get(CALLER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    if let Some(id) = caller {
        request.extensions_mut().insert(CallerId(id));
    }

    next.run(request).await
}
