//! Backend Module
//!
//! Storage adapters behind a single narrow contract.
//!
//! # Backends
//! - `memory` - in-process map, also used as a front cache
//! - `postgres` - one table keyed by `key`, atomic upsert
//! - `redis` - `SET`/`GET`, with revisions kept beside the payloads

mod memory;
mod postgres;
mod redis;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{BackendConfig, BackendKind};
use crate::error::BackendError;

pub use self::memory::MemoryBackend;
pub use self::postgres::{PostgresBackend, CACHE_TABLE};
pub use self::redis::RedisBackend;

/// Result type for adapter calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Monotonic write counter assigned by the backend that owns a record.
///
/// A later write to the same key always carries a larger revision.
pub type Revision = i64;

/// A payload as read back from a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored {
    pub payload: String,
    /// Revision of the write that produced `payload`
    pub revision: Revision,
}

// == Cache Backend Trait ==
/// A storage engine that can hold string payloads under string keys.
///
/// Implementations acquire whatever connection they need inside each call
/// and release it before returning, on every path.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short, stable name used in logs and health reports.
    fn name(&self) -> &str;

    /// Writes `payload` under `key`, replacing any previous payload.
    ///
    /// Returns the revision assigned to this write.
    async fn upsert(&self, key: &str, payload: &str) -> BackendResult<Revision>;

    /// Reads the payload under `key`. `Ok(None)` is a miss.
    async fn fetch(&self, key: &str) -> BackendResult<Option<Stored>>;

    /// Copies a payload written elsewhere at `revision`.
    ///
    /// The write only lands if `revision` is newer than anything this
    /// backend has held for `key`, evicted entries included. Returns
    /// whether it landed.
    async fn fill(&self, key: &str, payload: &str, revision: Revision) -> BackendResult<bool>;

    /// Drops the payload under `key`. A missing key is not an error.
    async fn evict(&self, key: &str) -> BackendResult<()>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> BackendResult<()>;
}

/// Shared handle to a backend.
pub type SharedBackend = Arc<dyn CacheBackend>;

// == Connect ==
/// Builds a backend of the given kind from configuration.
pub async fn connect(kind: BackendKind, config: &BackendConfig) -> BackendResult<SharedBackend> {
    let backend: SharedBackend = match kind {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::Postgres => {
            let backend = PostgresBackend::new(config)?;
            if config.database_ensure_schema {
                backend.ensure_schema().await?;
            }
            Arc::new(backend)
        }
        BackendKind::Redis => Arc::new(RedisBackend::new(&config.redis_url)?),
    };

    info!(backend = backend.name(), "backend ready");
    Ok(backend)
}
