//! Response DTOs for the cache HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::StatsSnapshot;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Body shared by the write-style operations (set, refresh, delete).
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    /// Success message
    pub message: String,
    /// The key the operation applied to
    pub key: String,
}

impl KeyResponse {
    pub fn set(key: impl Into<String>) -> Self {
        Self::with_verb(key.into(), "set")
    }

    pub fn refreshed(key: impl Into<String>) -> Self {
        Self::with_verb(key.into(), "refreshed")
    }

    pub fn deleted(key: impl Into<String>) -> Self {
        Self::with_verb(key.into(), "deleted")
    }

    fn with_verb(key: String, verb: &str) -> Self {
        Self {
            message: format!("Key '{}' {} successfully", key, verb),
            key,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub refreshes: u64,
    pub discarded_writes: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<StatsSnapshot> for StatsResponse {
    fn from(stats: StatsSnapshot) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            refreshes: stats.refreshes,
            discarded_writes: stats.discarded_writes,
            hit_rate: stats.hit_rate(),
        }
    }
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
