//! Error types for the cache service
//!
//! Two layers, both built with thiserror:
//! - [`BackendError`] is what a storage adapter reports.
//! - [`CacheError`] is what the service boundary reports, with the backend
//!   failure wrapped together with the operation and key it happened on.

use std::fmt;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Backend Error Enum ==
/// Failure raised by a storage adapter.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend could not be reached or no connection was available
    #[error("connection unavailable: {0}")]
    Connection(String),

    /// The backend did not answer in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The backend rejected or failed the command
    #[error("query failed: {0}")]
    Query(String),

    /// A stored payload is not valid JSON
    #[error("corrupt stored payload: {0}")]
    Corrupt(String),

    /// A value could not be turned into JSON text
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<tokio_postgres::Error> for BackendError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            BackendError::Connection(err.to_string())
        } else {
            BackendError::Query(err.to_string())
        }
    }
}

impl From<deadpool_postgres::PoolError> for BackendError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                BackendError::Connection("timed out waiting for a pooled connection".to_string())
            }
            deadpool_postgres::PoolError::Closed => {
                BackendError::Connection("connection pool is closed".to_string())
            }
            other => BackendError::Connection(other.to_string()),
        }
    }
}

impl From<deadpool_postgres::CreatePoolError> for BackendError {
    fn from(err: deadpool_postgres::CreatePoolError) -> Self {
        BackendError::Connection(format!("failed to create pool: {}", err))
    }
}

impl From<redis::RedisError> for BackendError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            BackendError::Connection(format!("redis timeout: {}", err))
        } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            BackendError::Connection(err.to_string())
        } else {
            BackendError::Query(err.to_string())
        }
    }
}

// == Operation ==
/// Service operation a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Store,
    Retrieve,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Store => f.write_str("store"),
            Operation::Retrieve => f.write_str("retrieve"),
        }
    }
}

// == Cache Error Enum ==
/// Unified error type for the cache service.
///
/// A cache miss is not represented here at the service level; `retrieve`
/// returns `Ok(None)`. [`CacheError::NotFound`] exists only so the HTTP layer
/// can turn a miss into a 404.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Caller supplied malformed input (blank key, missing value)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Key has no record
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Storage backend failure with attribution
    #[error("{operation} failed on backend '{backend}' for key '{key}': {source}")]
    Backend {
        operation: Operation,
        backend: String,
        key: String,
        #[source]
        source: BackendError,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Wraps a backend failure with the operation, backend and key.
    pub fn backend(
        operation: Operation,
        backend: impl Into<String>,
        key: impl Into<String>,
        source: BackendError,
    ) -> Self {
        CacheError::Backend {
            operation,
            backend: backend.into(),
            key: key.into(),
            source,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::NotFound(key) => (
                StatusCode::NOT_FOUND,
                format!("Cache item with key '{}' not found", key),
            ),
            CacheError::Backend { operation, .. } => {
                // Full detail goes to the log, never to the client
                error!(error = %self, "backend failure");
                let message = match operation {
                    Operation::Store => "Internal server error while storing cache item",
                    Operation::Retrieve => "Internal server error while retrieving cache item",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
            CacheError::Config(msg) => {
                error!(error = %msg, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(message));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
