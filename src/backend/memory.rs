//! Memory Backend
//!
//! In-process storage: a HashMap of records behind an async RwLock.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BackendResult, CacheBackend, Revision, Stored};
use crate::cache::CacheRecord;

#[derive(Debug, Default)]
struct Records {
    live: HashMap<String, CacheRecord>,
    /// Revision last held by each evicted key
    evicted: HashMap<String, Revision>,
    last_revision: Revision,
}

impl Records {
    fn current_revision(&self, key: &str) -> Revision {
        self.live
            .get(key)
            .map(|record| record.revision)
            .or_else(|| self.evicted.get(key).copied())
            .unwrap_or(0)
    }

    fn put(&mut self, key: &str, payload: &str, revision: Revision) {
        match self.live.get_mut(key) {
            Some(record) => record.replace(payload, revision),
            None => {
                self.live
                    .insert(key.to_string(), CacheRecord::new(key, payload, revision));
            }
        }
        self.evicted.remove(key);
        self.last_revision = self.last_revision.max(revision);
    }
}

// == Memory Backend ==
/// Stores records in process memory.
///
/// Writes replace the record for a key in place, so there is never more
/// than one record per key.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<Records>,
}

impl MemoryBackend {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Length ==
    /// Returns the current number of records.
    pub async fn len(&self) -> usize {
        self.records.read().await.live.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.live.is_empty()
    }

    // == Record ==
    /// Returns a copy of the full record for a key, timestamp included.
    pub async fn record(&self, key: &str) -> Option<CacheRecord> {
        self.records.read().await.live.get(key).cloned()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, key: &str, payload: &str) -> BackendResult<Revision> {
        let mut records = self.records.write().await;
        let revision = records.last_revision + 1;
        records.put(key, payload, revision);
        Ok(revision)
    }

    async fn fetch(&self, key: &str) -> BackendResult<Option<Stored>> {
        let records = self.records.read().await;
        Ok(records.live.get(key).map(|record| Stored {
            payload: record.value.clone(),
            revision: record.revision,
        }))
    }

    async fn fill(&self, key: &str, payload: &str, revision: Revision) -> BackendResult<bool> {
        let mut records = self.records.write().await;
        if revision <= records.current_revision(key) {
            return Ok(false);
        }
        records.put(key, payload, revision);
        Ok(true)
    }

    async fn evict(&self, key: &str) -> BackendResult<()> {
        let mut records = self.records.write().await;
        if let Some(record) = records.live.remove(key) {
            records.evicted.insert(key.to_string(), record.revision);
        }
        Ok(())
    }

    async fn ping(&self) -> BackendResult<()> {
        Ok(())
    }
}
