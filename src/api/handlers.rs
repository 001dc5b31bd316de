//! API Handlers
//!
//! HTTP request handlers for the demo profile endpoints and cache administration.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::directory::ProfileDirectory;
use crate::cache::{shared, CacheStore, InvalidationPattern, SharedCache};
use crate::error::{CacheError, Result};
use crate::middleware::CallerId;
use crate::models::{
    FlushResponse, HealthResponse, InvalidateRequest, InvalidateResponse, KeysResponse,
    ListParams, Profile, ProfileRequest, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Holds the response cache handle and the profile directory it fronts.
#[derive(Clone)]
pub struct AppState {
    /// Shared response cache
    pub cache: SharedCache,
    /// Thread-safe profile directory
    pub profiles: Arc<RwLock<ProfileDirectory>>,
}

impl AppState {
    /// Creates a new AppState with the given cache store and an empty directory.
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache: shared(cache),
            profiles: Arc::new(RwLock::new(ProfileDirectory::new())),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(CacheStore::new(config.max_entries, config.ttl_seconds))
    }
}

// == Profiles ==

/// Handler for GET /api/profiles
pub async fn list_profiles(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Profile>> {
    let profiles = state.profiles.read().await;
    Json(profiles.list(params.q.as_deref()))
}

/// Handler for GET /api/profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Profile>> {
    let profiles = state.profiles.read().await;
    profiles
        .get(id)
        .map(Json)
        .ok_or_else(|| CacheError::NotFound(format!("profile {}", id)))
}

/// Handler for POST /api/profiles
pub async fn create_profile(
    State(state): State<AppState>,
    caller: Option<Extension<CallerId>>,
    Json(req): Json<ProfileRequest>,
) -> Result<(StatusCode, Json<Profile>)> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let owner = caller.map(|Extension(CallerId(id))| id);
    let mut profiles = state.profiles.write().await;
    Ok((StatusCode::CREATED, Json(profiles.create(req, owner))))
}

/// Handler for PUT /api/profiles/:id
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<Profile>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut profiles = state.profiles.write().await;
    profiles
        .update(id, req)
        .map(Json)
        .ok_or_else(|| CacheError::NotFound(format!("profile {}", id)))
}

/// Handler for DELETE /api/profiles/:id
pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    let mut profiles = state.profiles.write().await;
    if profiles.delete(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CacheError::NotFound(format!("profile {}", id)))
    }
}

// == Cache Administration ==

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(cache.stats().into())
}

/// Handler for GET /cache/keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    let cache = state.cache.read().await;
    Json(KeysResponse::new(cache.keys()))
}

/// Handler for DELETE /cache
pub async fn flush_handler(State(state): State<AppState>) -> Json<FlushResponse> {
    let mut cache = state.cache.write().await;
    Json(FlushResponse::new(cache.flush()))
}

/// Handler for POST /cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let pattern = match (req.pattern, req.caller, req.route) {
        (Some(pattern), _, _) => InvalidationPattern::new(&pattern)?,
        (_, Some(caller), _) => InvalidationPattern::caller(&caller),
        (_, _, Some(route)) => InvalidationPattern::route_prefix(&route),
        (None, None, None) => {
            return Err(CacheError::InvalidRequest("No selector given".to_string()))
        }
    };

    let mut cache = state.cache.write().await;
    let invalidated = cache.invalidate(&pattern);

    Ok(Json(InvalidateResponse {
        pattern: pattern.as_str().to_string(),
        invalidated,
    }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
