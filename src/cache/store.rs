//! Cache Store Module
//!
//! Main cache engine: a bounded HashMap of JSON payloads with TTL expiration
//! and pattern invalidation.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, InvalidationPattern};

// == Cache Store ==
/// In-memory response store with TTL support and a hard entry cap.
///
/// When the store is full, inserting a new key is silently skipped; existing
/// keys can still be overwritten.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Hit/miss counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL in seconds used when `set` is called without one
    default_ttl: u64,
    /// Bumped by every invalidation and flush
    generation: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `default_ttl` - Default TTL in seconds for entries without explicit TTL
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
            generation: 0,
        }
    }

    /// Default TTL in seconds.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// Invalidation generation.
    ///
    /// A payload fetched while the generation moved may predate a mutation
    /// and should not be stored.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // == Set ==
    /// Stores a payload under `key`.
    ///
    /// Overwrites reset the insertion time. Returns false when the key is new
    /// and the store is already at capacity; nothing is stored in that case.
    pub fn set(&mut self, key: String, value: Value, ttl: Option<u64>) -> bool {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            // Expired entries still occupy slots until swept.
            let now = current_timestamp_ms();
            self.entries.retain(|_, entry| !entry.is_expired_at(now));
            if self.entries.len() >= self.max_entries {
                debug!("Cache full ({} entries), not storing {}", self.max_entries, key);
                return false;
            }
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.insert(key, CacheEntry::new(value, ttl));
        true
    }

    // == Get ==
    /// Returns a copy of the payload stored under `key`.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Keys ==
    /// Returns every live key.
    pub fn keys(&self) -> Vec<String> {
        let now = current_timestamp_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Flush ==
    /// Removes every entry and returns how many were removed.
    pub fn flush(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.generation += 1;
        count
    }

    // == Invalidate ==
    /// Removes every key matched by `pattern` and returns the number removed.
    pub fn invalidate(&mut self, pattern: &InvalidationPattern) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.matches(key));
        let removed = before - self.entries.len();
        self.generation += 1;
        debug!("Invalidated {} keys matching {:?}", removed, pattern.as_str());
        removed
    }

    /// Removes every entry cached for `caller_id`.
    pub fn invalidate_caller(&mut self, caller_id: &str) -> usize {
        self.invalidate(&InvalidationPattern::caller(caller_id))
    }

    /// Removes every entry whose request path starts with `prefix`.
    pub fn invalidate_route(&mut self, prefix: &str) -> usize {
        self.invalidate(&InvalidationPattern::route_prefix(prefix))
    }

    // == Stats ==
    /// Returns a snapshot of cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = current_timestamp_ms();
        let mut stats = self.stats.clone();
        for (key, entry) in &self.entries {
            if entry.is_expired_at(now) {
                continue;
            }
            stats.keys += 1;
            stats.ksize += key.len();
            stats.vsize += entry.size;
        }
        stats
    }

    // == Expiry Sweep ==
    /// Returns the keys of every expired entry.
    pub fn expired_keys(&self) -> Vec<String> {
        let now = current_timestamp_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Removes `key` only if it is still expired.
    ///
    /// The entry may have been overwritten since it was reported expired.
    pub fn remove_if_expired(&mut self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                true
            }
            _ => false,
        }
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
