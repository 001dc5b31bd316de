//! Response DTOs for the profiles and cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// A vCard-style profile (GET /api/profiles/:id)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Caller that created the profile, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Response body for the stats endpoint (GET /cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of live cached responses
    pub keys: usize,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Approximate key bytes
    pub ksize: usize,
    /// Approximate value bytes
    pub vsize: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            keys: stats.keys,
            hits: stats.hits,
            misses: stats.misses,
            ksize: stats.ksize,
            vsize: stats.vsize,
        }
    }
}

/// Response body for GET /cache/keys
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub count: usize,
    pub keys: Vec<String>,
}

impl KeysResponse {
    /// Creates a KeysResponse with keys sorted for stable output
    pub fn new(mut keys: Vec<String>) -> Self {
        keys.sort();
        Self {
            count: keys.len(),
            keys,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    pub message: String,
    pub flushed: usize,
}

impl FlushResponse {
    pub fn new(flushed: usize) -> Self {
        Self {
            message: format!("Flushed {} cached responses", flushed),
            flushed,
        }
    }
}

/// Response body for POST /cache/invalidate
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Pattern source that was applied
    pub pattern: String,
    /// Number of cached responses removed
    pub invalidated: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_skips_missing_fields() {
        let profile = Profile {
            id: 7,
            name: "Ada".to_string(),
            title: None,
            owner: None,
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"id":7,"name":"Ada"}"#);
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            keys: 3,
            hits: 80,
            misses: 20,
            ksize: 10,
            vsize: 20,
        };
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.keys, 3);
    }

    #[test]
    fn test_keys_response_sorted() {
        let resp = KeysResponse::new(vec!["b".to_string(), "a".to_string()]);
        assert_eq!(resp.keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(resp.count, 2);
    }

    #[test]
    fn test_flush_response_serialize() {
        let json = serde_json::to_string(&FlushResponse::new(4)).unwrap();
        assert!(json.contains("\"flushed\":4"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
