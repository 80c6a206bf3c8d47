//! API Handlers
//!
//! HTTP request handlers translating each endpoint into one engine operation.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use crate::cache::CacheEngine;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{GetResponse, HealthResponse, MessageResponse, SetRequest, StatsResponse};

/// Application state shared across all handlers.
///
/// The engine serializes access internally, so handlers only share a handle.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheEngine>,
}

impl AppState {
    /// Creates a new AppState wrapping the given engine.
    pub fn new(cache: CacheEngine) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Builds the engine described by the configuration.
    ///
    /// Fails on an unknown eviction policy or zero capacity.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(CacheEngine::from_config(config)?))
    }
}

/// Handler for PUT|POST /set/:key
///
/// Body rejections (bad JSON, wrong field types, missing content type) are
/// reported through [`CacheError`] so every error body has the same shape.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: std::result::Result<Json<SetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let Json(req) = payload.map_err(|rejection| {
        CacheError::InvalidRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set(key.clone(), req.value, req.ttl)?;

    Ok((StatusCode::CREATED, Json(MessageResponse::added(key))))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get_with_ttl(&key) {
        Some((value, ttl)) => Ok(Json(GetResponse::new(key, value, ttl))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /get/ (no key segment)
pub async fn missing_key_handler() -> Result<Json<GetResponse>> {
    Err(CacheError::InvalidRequest("Key is missing".to_string()))
}

/// Handler for DELETE /delete/:key
///
/// Succeeds whether or not the key was present.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<MessageResponse> {
    if !state.cache.delete(&key) {
        debug!("Delete requested for absent key: {}", key);
    }

    Json(MessageResponse::deleted(key))
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.clear();
    Json(MessageResponse::cleared())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();
    Json(StatsResponse::new(state.cache.policy(), &stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
