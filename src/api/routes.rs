//! API Routes
//!
//! Configures the Axum router: cached profile endpoints plus cache administration.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_profile, delete_profile, flush_handler, get_profile, health_handler,
    invalidate_handler, keys_handler, list_profiles, stats_handler, update_profile, AppState,
};
use crate::cache::InvalidationPattern;
use crate::middleware::{
    cache_response, identify_caller, invalidate_on_success, CachePolicy, InvalidationPolicy,
};

/// Path prefix of the cached profile endpoints.
pub const PROFILES_PREFIX: &str = "/api/profiles";

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/profiles`, `GET /api/profiles/:id` - Cached reads
/// - `POST /api/profiles`, `PUT|DELETE /api/profiles/:id` - Mutations that invalidate `/api/profiles`
/// - `GET /cache/stats` - Cache statistics
/// - `GET /cache/keys` - Live cache keys
/// - `DELETE /cache` - Flush the cache
/// - `POST /cache/invalidate` - Invalidate by pattern, caller or route
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Caller identity: `x-user-id` header becomes a `CallerId` extension
/// - Response cache and invalidation on the profile routes
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let read_policy = CachePolicy::new(state.cache.clone());
    let invalidation = InvalidationPolicy::compiled(
        state.cache.clone(),
        vec![InvalidationPattern::route_prefix(PROFILES_PREFIX)],
    );

    let profiles = Router::new()
        .route(PROFILES_PREFIX, get(list_profiles).post(create_profile))
        .route(
            "/api/profiles/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .layer(from_fn_with_state(invalidation, invalidate_on_success))
        .layer(from_fn_with_state(read_policy, cache_response));

    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(profiles)
        .route("/cache", delete(flush_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/keys", get(keys_handler))
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/health", get(health_handler))
        .layer(from_fn(identify_caller))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
