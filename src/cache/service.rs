//! Cache Service Module
//!
//! The store/retrieve contract over a primary backend and an optional front
//! cache. Values are encoded to JSON text on the way in and decoded on the
//! way out. A miss is `Ok(None)`, never an error.
//!
//! The primary owns every record. The front cache only ever holds copies
//! tagged with the primary's revision, and a copy never replaces a newer
//! one. Front cache failures are logged and never fail a call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::backend::{BackendResult, CacheBackend, Revision, SharedBackend, Stored};
use crate::cache::{decode, encode, CacheKey, CacheLimits, CacheValue};
use crate::error::{BackendError, CacheError, Operation, Result};

/// Default upper bound for a single backend call.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

// == Cache Service ==
/// Uniform store/retrieve contract over one or two backends.
///
/// Holds no lock and no shared state of its own; cloning is cheap.
#[derive(Clone)]
pub struct CacheService {
    primary: SharedBackend,
    front: Option<SharedBackend>,
    operation_timeout: Duration,
    limits: CacheLimits,
}

impl CacheService {
    // == Constructor ==
    /// Creates a service over a single primary backend.
    pub fn new(primary: SharedBackend) -> Self {
        Self {
            primary,
            front: None,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            limits: CacheLimits::default(),
        }
    }

    /// Places a cache in front of the primary backend.
    ///
    /// Writes commit to the primary and are then copied to the front; reads
    /// try the front first and fill it from the primary on a miss.
    pub fn with_front_cache(mut self, front: SharedBackend) -> Self {
        self.front = Some(front);
        self
    }

    /// Sets the upper bound for each backend call.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Sets the key length and payload size bounds.
    pub fn with_limits(mut self, limits: CacheLimits) -> Self {
        self.limits = limits;
        self
    }

    /// All configured backends, front cache first.
    pub fn backends(&self) -> Vec<SharedBackend> {
        self.front
            .iter()
            .chain(std::iter::once(&self.primary))
            .map(Arc::clone)
            .collect()
    }

    // == Store ==
    /// Stores a JSON value under `key` and returns the key that was written.
    ///
    /// Storing the same value twice leaves the same observable state.
    /// Concurrent writers to one key are ordered by the primary backend.
    pub async fn store(&self, key: &str, value: &CacheValue) -> Result<String> {
        let key = self.parse_key(key)?;
        let payload = encode(value)
            .map_err(|e| CacheError::backend(Operation::Store, "codec", key.as_str(), e))?;
        self.write(key, &payload).await
    }

    // == Retrieve ==
    /// Looks up the JSON value for `key`.
    ///
    /// Returns `Ok(None)` when no record exists. A payload that is not valid
    /// JSON is reported as a backend failure.
    pub async fn retrieve(&self, key: &str) -> Result<Option<CacheValue>> {
        let key = self.parse_key(key)?;
        let Some((backend, payload)) = self.read(&key).await? else {
            return Ok(None);
        };

        decode(&payload).map(Some).map_err(|e| {
            error!(key = %key, backend = %backend, error = %e, "stored payload is not valid JSON");
            CacheError::backend(Operation::Retrieve, backend, key.as_str(), e)
        })
    }

    // == Raw Mode ==
    /// Stores an opaque string without JSON encoding.
    ///
    /// An empty string counts as a missing value.
    pub async fn store_raw(&self, key: &str, value: &str) -> Result<String> {
        let key = self.parse_key(key)?;
        if value.is_empty() {
            return Err(CacheError::Validation("Value is required".to_string()));
        }
        self.write(key, value).await
    }

    /// Looks up an opaque string stored with [`CacheService::store_raw`].
    pub async fn retrieve_raw(&self, key: &str) -> Result<Option<String>> {
        let key = self.parse_key(key)?;
        Ok(self.read(&key).await?.map(|(_, payload)| payload))
    }

    // == Internals ==
    fn parse_key(&self, raw: &str) -> Result<CacheKey> {
        let key = CacheKey::parse(raw)?;
        self.limits.check_key(&key)?;
        Ok(key)
    }

    async fn write(&self, key: CacheKey, payload: &str) -> Result<String> {
        self.limits.check_payload(payload)?;

        let revision = self
            .call(Operation::Store, &self.primary, &key, |b| {
                let key = key.as_str();
                async move { b.upsert(key, payload).await }
            })
            .await?;

        // Committed: from here on nothing may fail the store
        if let Some(front) = &self.front {
            self.copy_to_front(front, &key, payload, revision).await;
        }

        info!(key = %key, backend = self.primary.name(), revision, "stored cache item");
        Ok(key.into_inner())
    }

    /// Returns the payload and the name of the backend it came from.
    async fn read(&self, key: &CacheKey) -> Result<Option<(String, String)>> {
        if let Some(front) = &self.front {
            match self.attempt(front, |b| {
                let key = key.as_str();
                async move { b.fetch(key).await }
            })
            .await
            {
                Ok(Some(hit)) => {
                    debug!(key = %key, backend = front.name(), "front cache hit");
                    return Ok(Some((front.name().to_string(), hit.payload)));
                }
                Ok(None) => {}
                Err(e) => warn!(
                    key = %key,
                    backend = front.name(),
                    error = %e,
                    "front cache read failed, using primary"
                ),
            }
        }

        let fetched: Option<Stored> = self
            .call(Operation::Retrieve, &self.primary, key, |b| {
                let key = key.as_str();
                async move { b.fetch(key).await }
            })
            .await?;
        let Some(stored) = fetched else {
            info!(key = %key, "cache item not found");
            return Ok(None);
        };

        if let Some(front) = &self.front {
            self.copy_to_front(front, key, &stored.payload, stored.revision)
                .await;
        }

        Ok(Some((self.primary.name().to_string(), stored.payload)))
    }

    /// Copies a committed payload into the front cache.
    ///
    /// A copy older than what the front already holds is dropped there. If
    /// the copy fails the front entry is evicted so the next read goes to
    /// the primary.
    async fn copy_to_front(
        &self,
        front: &SharedBackend,
        key: &CacheKey,
        payload: &str,
        revision: Revision,
    ) {
        let filled = self
            .attempt(front, |b| {
                let key = key.as_str();
                async move { b.fill(key, payload, revision).await }
            })
            .await;

        match filled {
            Ok(landed) => {
                debug!(key = %key, backend = front.name(), revision, landed, "front cache filled");
                return;
            }
            Err(e) => warn!(
                key = %key,
                backend = front.name(),
                error = %e,
                "front cache write failed, evicting"
            ),
        }

        let evicted = self
            .attempt(front, |b| {
                let key = key.as_str();
                async move { b.evict(key).await }
            })
            .await;
        if let Err(e) = evicted {
            error!(
                key = %key,
                backend = front.name(),
                error = %e,
                "front cache eviction failed, entry may be stale until the next store"
            );
        }
    }

    /// Runs one backend call under the operation timeout.
    async fn attempt<'a, T, F, Fut>(&self, backend: &'a SharedBackend, f: F) -> BackendResult<T>
    where
        F: FnOnce(&'a dyn CacheBackend) -> Fut,
        Fut: Future<Output = BackendResult<T>> + 'a,
    {
        tokio::time::timeout(self.operation_timeout, f(backend.as_ref()))
            .await
            .unwrap_or(Err(BackendError::Timeout(self.operation_timeout)))
    }

    /// Like [`CacheService::attempt`], and attributes any failure to the
    /// operation, backend and key.
    async fn call<'a, T, F, Fut>(
        &self,
        operation: Operation,
        backend: &'a SharedBackend,
        key: &CacheKey,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce(&'a dyn CacheBackend) -> Fut,
        Fut: Future<Output = BackendResult<T>> + 'a,
    {
        self.attempt(backend, f).await.map_err(|e| {
            error!(
                operation = %operation,
                backend = backend.name(),
                key = %key,
                error = %e,
                "backend call failed"
            );
            CacheError::backend(operation, backend.name(), key.as_str(), e)
        })
    }
}
