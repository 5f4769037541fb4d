//! API Handlers
//!
//! HTTP request handlers mapping each endpoint onto a cache operation.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::DistributedCache;
use crate::error::{CacheError, Result};
use crate::models::{GetResponse, HealthResponse, KeyResponse, SetRequest, StatsResponse};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Shared cache; clones share the same store and counters
    pub cache: DistributedCache,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: DistributedCache) -> Self {
        Self { cache }
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair with optional absolute, relative and sliding expiration.
/// A write that is already expired is accepted and dropped.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<KeyResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidArgument(error_msg));
    }

    let options = req.entry_options();
    state.cache.set_string(&req.key, &req.value, &options).await?;

    Ok(Json(KeyResponse::set(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value, extending its sliding window. Misses map to 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get_string(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for POST /refresh/:key
pub async fn refresh_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyResponse>> {
    state.cache.refresh(&key).await?;
    Ok(Json(KeyResponse::refreshed(key)))
}

/// Handler for DELETE /del/:key
///
/// Deleting a key that does not exist still succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyResponse>> {
    state.cache.remove(&key).await?;
    Ok(Json(KeyResponse::deleted(key)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
