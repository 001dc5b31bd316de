//! Cache Entry Module
//!
//! Defines a cached response payload together with its insertion time and TTL.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

// == Cache Entry ==
/// A single cached response payload with TTL metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached JSON payload
    pub value: Value,
    /// Insertion timestamp (Unix milliseconds)
    pub inserted_at: u64,
    /// Time-to-live in seconds
    pub ttl_seconds: u64,
    /// Serialized payload length in bytes
    pub size: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(value: Value, ttl_seconds: u64) -> Self {
        Self::new_at(value, ttl_seconds, current_timestamp_ms())
    }

    /// Creates a new entry stamped with an explicit insertion time.
    pub fn new_at(value: Value, ttl_seconds: u64, inserted_at: u64) -> Self {
        let size = value.to_string().len();
        Self {
            value,
            inserted_at,
            ttl_seconds,
            size,
        }
    }

    // == Expiry ==
    /// Unix millisecond timestamp at which the entry stops being served.
    pub fn expires_at(&self) -> u64 {
        self.inserted_at
            .saturating_add(self.ttl_seconds.saturating_mul(1000))
    }

    /// Checks expiry against a given timestamp.
    ///
    /// An entry is expired once `now` reaches `inserted_at + ttl`, so a zero
    /// TTL entry is never served.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at()
    }

    /// Checks expiry against the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    // == Time To Live ==
    /// Returns remaining TTL in seconds, or 0 once expired.
    pub fn ttl_remaining(&self) -> u64 {
        self.expires_at().saturating_sub(current_timestamp_ms()) / 1000
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
