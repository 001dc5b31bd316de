//! Integration Tests for the cached API
//!
//! Drives the full router (caller identity, response cache, invalidation,
//! admin endpoints) through complete request/response cycles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    response::Response,
    routing::get,
    Json, Router,
};
use response_cache::{
    api::create_router,
    cache::{shared, CacheStore},
    cache_response,
    middleware::{X_CACHE, X_CACHE_KEY},
    models::ProfileRequest,
    AppState, CachePolicy,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

/// Builds an app whose directory already holds profiles 1..=count.
async fn seeded_app(count: u64) -> (Router, AppState) {
    let state = AppState::new(CacheStore::new(100, 60));
    {
        let mut profiles = state.profiles.write().await;
        for n in 1..=count {
            profiles.create(
                ProfileRequest {
                    name: format!("Profile {}", n),
                    title: None,
                },
                None,
            );
        }
    }
    (create_router(state.clone()), state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = caller {
        builder = builder.header("x-user-id", id);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn body_to_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn cache_status(response: &Response) -> &str {
    response.headers()[X_CACHE].to_str().unwrap()
}

/// Renames a profile behind the API's back, so no invalidation runs.
async fn rename_directly(state: &AppState, id: u64, name: &str) {
    state.profiles.write().await.update(
        id,
        ProfileRequest {
            name: name.to_string(),
            title: None,
        },
    );
}

// == Scenario ==

#[tokio::test]
async fn test_profile_scenario_miss_hit_invalidate_miss() {
    let (app, state) = seeded_app(7).await;

    let first = send(&app, "GET", "/api/profiles/7", None, None).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(cache_status(&first), "MISS");
    assert_eq!(
        first.headers()[X_CACHE_KEY],
        r#"GET:"/api/profiles/7":{}:user:"anonymous""#
    );
    let original = body_to_json(first).await;
    assert_eq!(original["id"], 7);

    // The handler is not consulted on a hit: a silent change stays invisible.
    rename_directly(&state, 7, "Changed quietly").await;
    let second = send(&app, "GET", "/api/profiles/7", None, None).await;
    assert_eq!(cache_status(&second), "HIT");
    assert_eq!(body_to_json(second).await, original);

    let update = send(
        &app,
        "PUT",
        "/api/profiles/7",
        None,
        Some(json!({"name": "Updated"})),
    )
    .await;
    assert_eq!(update.status(), StatusCode::OK);

    let third = send(&app, "GET", "/api/profiles/7", None, None).await;
    assert_eq!(cache_status(&third), "MISS");
    assert_eq!(body_to_json(third).await["name"], "Updated");
}

// == Cache-aside ==

#[tokio::test]
async fn test_downstream_called_once_within_ttl() {
    let cache = shared(CacheStore::new(100, 60));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let app = Router::new()
        .route(
            "/api/services",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"services": ["recovery"]}))
                }
            }),
        )
        .layer(from_fn_with_state(CachePolicy::new(cache.clone()), cache_response));

    for _ in 0..5 {
        let response = send(&app, "GET", "/api/services", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let stats = cache.read().await.stats();
    assert_eq!(stats.hits, 4);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.keys, 1);
}

#[tokio::test]
async fn test_query_and_caller_partition_the_cache() {
    let (app, _) = seeded_app(3).await;

    send(&app, "GET", "/api/profiles?q=profile", None, None).await;
    let other_query = send(&app, "GET", "/api/profiles?q=1", None, None).await;
    assert_eq!(cache_status(&other_query), "MISS");

    let other_caller = send(&app, "GET", "/api/profiles?q=profile", Some("user42"), None).await;
    assert_eq!(cache_status(&other_caller), "MISS");

    let same = send(&app, "GET", "/api/profiles?q=profile", Some("user42"), None).await;
    assert_eq!(cache_status(&same), "HIT");
}

#[tokio::test]
async fn test_query_order_shares_an_entry() {
    let (app, _) = seeded_app(3).await;

    let first = send(&app, "GET", "/api/profiles?q=profile&x=1", None, None).await;
    assert_eq!(cache_status(&first), "MISS");

    let reordered = send(&app, "GET", "/api/profiles?x=1&q=profile", None, None).await;
    assert_eq!(cache_status(&reordered), "HIT");
    assert_eq!(
        reordered.headers()[X_CACHE_KEY],
        r#"GET:"/api/profiles?q=profile&x=1":{"q":"profile","x":"1"}:user:"anonymous""#
    );
}

#[tokio::test]
async fn test_not_found_is_not_cached() {
    let (app, state) = seeded_app(1).await;

    let first = send(&app, "GET", "/api/profiles/404", None, None).await;
    assert_eq!(first.status(), StatusCode::NOT_FOUND);
    let second = send(&app, "GET", "/api/profiles/404", None, None).await;
    assert_eq!(cache_status(&second), "MISS");

    assert!(state.cache.read().await.is_empty());
}

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let state = AppState::new(CacheStore::new(100, 1));
    let app = create_router(state.clone());

    send(&app, "GET", "/api/profiles", None, None).await;
    let hit = send(&app, "GET", "/api/profiles", None, None).await;
    assert_eq!(cache_status(&hit), "HIT");

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let expired = send(&app, "GET", "/api/profiles", None, None).await;
    assert_eq!(cache_status(&expired), "MISS");
}

// == Write-path invalidation ==

#[tokio::test]
async fn test_create_invalidates_list() {
    let (app, _) = seeded_app(2).await;

    let list = send(&app, "GET", "/api/profiles", None, None).await;
    assert_eq!(body_to_json(list).await.as_array().unwrap().len(), 2);

    let created = send(&app, "POST", "/api/profiles", None, Some(json!({"name": "New"}))).await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let list = send(&app, "GET", "/api/profiles", None, None).await;
    assert_eq!(cache_status(&list), "MISS");
    assert_eq!(body_to_json(list).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_failed_mutation_keeps_cache() {
    let (app, state) = seeded_app(1).await;

    send(&app, "GET", "/api/profiles/1", None, None).await;
    let rejected = send(&app, "PUT", "/api/profiles/1", None, Some(json!({"name": ""}))).await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    assert_eq!(state.cache.read().await.len(), 1);
}

#[tokio::test]
async fn test_mutation_drops_callers_own_entries() {
    let (app, state) = seeded_app(1).await;
    {
        // An entry outside the profile routes, cached for user42.
        let mut cache = state.cache.write().await;
        cache.set(
            response_cache::cache::derive_key("GET", "/api/services", &[], Some("user42")),
            json!({"services": []}),
            None,
        );
        cache.set(
            response_cache::cache::derive_key("GET", "/api/services", &[], None),
            json!({"services": []}),
            None,
        );
    }

    let deleted = send(&app, "DELETE", "/api/profiles/1", Some("user42"), None).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let keys = state.cache.read().await.keys();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].ends_with(r#":user:"anonymous""#));
}

// == Admin endpoints ==

#[tokio::test]
async fn test_stats_endpoint() {
    let (app, _) = seeded_app(1).await;

    send(&app, "GET", "/api/profiles/1", None, None).await;
    send(&app, "GET", "/api/profiles/1", None, None).await;

    let response = send(&app, "GET", "/cache/stats", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["keys"], 1);
    assert!(json["ksize"].as_u64().unwrap() > 0);
    assert!(json["vsize"].as_u64().unwrap() > 0);
    assert_eq!(json["hit_rate"], 0.5);
}

#[tokio::test]
async fn test_keys_and_flush_endpoints() {
    let (app, _) = seeded_app(2).await;

    send(&app, "GET", "/api/profiles/1", None, None).await;
    send(&app, "GET", "/api/profiles/2", None, None).await;

    let keys = body_to_json(send(&app, "GET", "/cache/keys", None, None).await).await;
    assert_eq!(keys["count"], 2);

    let flushed = body_to_json(send(&app, "DELETE", "/cache", None, None).await).await;
    assert_eq!(flushed["flushed"], 2);

    let keys = body_to_json(send(&app, "GET", "/cache/keys", None, None).await).await;
    assert_eq!(keys["count"], 0);
}

#[tokio::test]
async fn test_invalidate_endpoint() {
    let (app, _) = seeded_app(2).await;

    send(&app, "GET", "/api/profiles/1", None, None).await;
    send(&app, "GET", "/api/profiles/2", Some("user42"), None).await;

    let response = send(
        &app,
        "POST",
        "/cache/invalidate",
        None,
        Some(json!({"pattern": "user42"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await["invalidated"], 1);

    let still_cached = send(&app, "GET", "/api/profiles/1", None, None).await;
    assert_eq!(cache_status(&still_cached), "HIT");
}

#[tokio::test]
async fn test_invalidate_endpoint_bad_pattern() {
    let (app, _) = seeded_app(0).await;

    let response = send(
        &app,
        "POST",
        "/cache/invalidate",
        None,
        Some(json!({"pattern": "(unclosed"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_to_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("Invalid pattern"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = seeded_app(0).await;

    let response = send(&app, "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await["status"], "healthy");
}
