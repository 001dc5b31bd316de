//! Response Cache - cache-aside HTTP response caching for axum
//!
//! Serves repeated GET requests from an in-memory TTL store and drops stale
//! entries by pattern when a mutation succeeds.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, SharedCache};
pub use config::Config;
pub use middleware::{cache_response, invalidate_on_success, CachePolicy, InvalidationPolicy};
pub use tasks::spawn_sweep_task;
