//! Cache Module
//!
//! Provides the in-memory response store with TTL expiration, key derivation
//! and pattern invalidation.

mod entry;
pub mod key;
mod pattern;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use key::{derive_key, ANONYMOUS};
pub use pattern::InvalidationPattern;
pub use stats::CacheStats;
pub use store::CacheStore;

/// Handle to the process-wide store shared by middleware, handlers and the sweep task.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store in a shareable handle.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
