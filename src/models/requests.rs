//! Request DTOs for the cache HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::cache::EntryOptions;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `expires_at`: Optional absolute expiration (RFC 3339)
/// - `ttl`: Optional lifetime in seconds from now, wins over `expires_at`
/// - `sliding`: Optional sliding window in seconds
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub sliding: Option<i64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.ttl.is_some_and(|s| Duration::try_seconds(s).is_none()) {
            return Some("ttl is out of range".to_string());
        }
        if self.sliding.is_some_and(|s| Duration::try_seconds(s).is_none()) {
            return Some("sliding is out of range".to_string());
        }
        None
    }

    /// Converts the expiration fields into cache options.
    pub fn entry_options(&self) -> EntryOptions {
        EntryOptions {
            absolute_expiration: self.expires_at,
            absolute_expiration_relative_to_now: self.ttl.and_then(Duration::try_seconds),
            sliding_expiration: self.sliding.and_then(Duration::try_seconds),
        }
    }
}
