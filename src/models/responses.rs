//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::CacheValue;
use crate::health::{HealthReport, HealthStatus};

/// Response body for the store operation (POST /api/v1/store)
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    /// The key that was written
    pub key: String,
}

impl StoreResponse {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Response body for the retrieve operation (GET /api/v1/retrieve/:key)
#[derive(Debug, Clone, Serialize)]
pub struct RetrieveResponse {
    /// The stored value
    pub value: CacheValue,
}

impl RetrieveResponse {
    pub fn new(value: CacheValue) -> Self {
        Self { value }
    }
}

/// Response body for the opaque-string endpoints (/cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct RawEntryResponse {
    pub key: String,
    pub value: String,
}

impl RawEntryResponse {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" only when every backend is reachable
    pub status: HealthStatus,
    /// Reachability per backend
    pub components: BTreeMap<String, bool>,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        Self {
            status: report.status,
            components: report.components,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
