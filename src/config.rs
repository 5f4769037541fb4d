//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

use chrono::Duration;

use crate::cache::CacheSettings;
use crate::store::DEFAULT_COLLECTION_NAME;

/// Cache and host configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection string including the database name
    pub connection_string: Option<String>,
    /// Collection holding cache documents
    pub collection_name: String,
    /// Whether `get` awaits the sliding refresh write before returning
    pub wait_for_refresh_on_get: bool,
    /// Expired-entry sweep interval in seconds, None = sweeper disabled
    pub sweep_interval: Option<u64>,
    /// Sliding window in seconds applied to writes without any expiration
    pub default_sliding_expiration: Option<u64>,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MONGO_CACHE_CONNECTION_STRING` - e.g. `mongodb://localhost/caching` (no default)
    /// - `MONGO_CACHE_COLLECTION` - Collection name (default: cache)
    /// - `MONGO_CACHE_WAIT_FOR_REFRESH` - true/false (default: true)
    /// - `MONGO_CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds, 0 disables (default: unset)
    /// - `MONGO_CACHE_DEFAULT_SLIDING` - Default sliding window in seconds (default: unset)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            connection_string: env::var("MONGO_CACHE_CONNECTION_STRING")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            collection_name: env::var("MONGO_CACHE_COLLECTION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.collection_name),
            wait_for_refresh_on_get: env::var("MONGO_CACHE_WAIT_FOR_REFRESH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.wait_for_refresh_on_get),
            sweep_interval: env::var("MONGO_CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&secs| secs > 0),
            default_sliding_expiration: env::var("MONGO_CACHE_DEFAULT_SLIDING")
                .ok()
                .and_then(|v| v.parse().ok()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// Settings for [`DistributedCache`](crate::cache::DistributedCache).
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            wait_for_refresh_on_get: self.wait_for_refresh_on_get,
            default_sliding_expiration: self
                .default_sliding_expiration
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(Duration::try_seconds),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection_string: None,
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            wait_for_refresh_on_get: true,
            sweep_interval: None,
            default_sliding_expiration: None,
            server_port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.connection_string.is_none());
        assert_eq!(config.collection_name, "cache");
        assert!(config.wait_for_refresh_on_get);
        assert!(config.sweep_interval.is_none());
        assert!(config.default_sliding_expiration.is_none());
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("MONGO_CACHE_CONNECTION_STRING");
        env::remove_var("MONGO_CACHE_COLLECTION");
        env::remove_var("MONGO_CACHE_WAIT_FOR_REFRESH");
        env::remove_var("MONGO_CACHE_SWEEP_INTERVAL");
        env::remove_var("MONGO_CACHE_DEFAULT_SLIDING");
        env::remove_var("SERVER_PORT");

        let config = Config::from_env();
        assert!(config.connection_string.is_none());
        assert_eq!(config.collection_name, "cache");
        assert!(config.wait_for_refresh_on_get);
        assert!(config.sweep_interval.is_none());
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_cache_settings_conversion() {
        let config = Config {
            wait_for_refresh_on_get: false,
            default_sliding_expiration: Some(1200),
            ..Config::default()
        };

        let settings = config.cache_settings();
        assert!(!settings.wait_for_refresh_on_get);
        assert_eq!(
            settings.default_sliding_expiration,
            Some(Duration::minutes(20))
        );
    }
}
