//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint. Each handler is a
//! thin mapping onto [`CacheService`] or [`HealthAggregator`].

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{info, warn};

use crate::backend::{self, MemoryBackend, SharedBackend};
use crate::cache::CacheService;
use crate::config::{BackendConfig, BackendKind, Config};
use crate::error::{CacheError, Result};
use crate::health::{HealthAggregator, DEFAULT_PROBE_TIMEOUT};
use crate::models::{
    HealthResponse, RawEntryResponse, RawStoreQuery, RetrieveResponse, StoreRequest,
    StoreResponse,
};

/// Application state shared across all handlers.
///
/// Holds backend handles only; there is no lock or shared mutable state
/// between requests.
#[derive(Clone)]
pub struct AppState {
    /// Store/retrieve contract
    pub cache: CacheService,
    /// Composite liveness over the cache's backends
    pub health: HealthAggregator,
}

impl AppState {
    /// Creates a new AppState probing every backend of the given service.
    pub fn new(cache: CacheService) -> Self {
        Self::with_probe_timeout(cache, DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_probe_timeout(cache: CacheService, probe_timeout: Duration) -> Self {
        let health = HealthAggregator::from_service(&cache, probe_timeout);
        Self { cache, health }
    }

    /// Creates an AppState over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(CacheService::new(std::sync::Arc::new(MemoryBackend::new())))
    }

    /// Creates a new AppState from configuration.
    ///
    /// Connects the primary backend and, if configured, the front cache.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let settings = &config.backend;
        settings.validate()?;

        let mut cache = CacheService::new(connect_backend(settings.primary, settings).await?)
            .with_operation_timeout(settings.operation_timeout)
            .with_limits(config.limits);
        if let Some(front) = settings.front {
            cache = cache.with_front_cache(connect_backend(front, settings).await?);
        }

        Ok(Self::with_probe_timeout(cache, settings.probe_timeout))
    }
}

async fn connect_backend(kind: BackendKind, settings: &BackendConfig) -> Result<SharedBackend> {
    backend::connect(kind, settings)
        .await
        .map_err(|e| CacheError::Config(format!("failed to initialize {} backend: {}", kind, e)))
}

/// Handler for POST /api/v1/store
///
/// Stores a JSON value and echoes the key that was written.
pub async fn store_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<StoreResponse>> {
    let (key, value) = req.into_parts().inspect_err(|e| {
        warn!(error = %e, "invalid store request");
    })?;

    let key = state.cache.store(&key, &value).await?;

    Ok(Json(StoreResponse::new(key)))
}

/// Handler for GET /api/v1/retrieve/:key
///
/// A miss becomes a 404; a backend failure becomes a 500.
pub async fn retrieve_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<RetrieveResponse>> {
    match state.cache.retrieve(&key).await? {
        Some(value) => Ok(Json(RetrieveResponse::new(value))),
        None => {
            info!(key = %key, "cache item not found");
            Err(CacheError::NotFound(key))
        }
    }
}

/// Handler for POST /cache/:key?value=...
///
/// Stores an opaque string.
pub async fn raw_store_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<RawStoreQuery>,
) -> Result<Json<RawEntryResponse>> {
    let value = query.value.unwrap_or_default();
    let key = state.cache.store_raw(&key, &value).await?;

    Ok(Json(RawEntryResponse::new(key, value)))
}

/// Handler for GET /cache/:key
///
/// Retrieves an opaque string.
pub async fn raw_retrieve_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<RawEntryResponse>> {
    match state.cache.retrieve_raw(&key).await? {
        Some(value) => Ok(Json(RawEntryResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /health
///
/// Reports "healthy" only when every backend answers its probe.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = state.health.check().await;
    Json(HealthResponse::from(report))
}
