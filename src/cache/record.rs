//! Cache Record Module
//!
//! The shape of one stored entry.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::Revision;

// == Cache Record ==
/// A single stored entry: one live record per key.
#[derive(Debug, Clone, Serialize)]
pub struct CacheRecord {
    /// The exact key the record was written under
    pub key: String,
    /// The stored payload (JSON text, or an opaque string in raw mode)
    pub value: String,
    /// Revision of the last write
    pub revision: Revision,
    /// Time of the last write
    pub written_at: DateTime<Utc>,
}

impl CacheRecord {
    // == Constructor ==
    /// Creates a record stamped with the current time.
    pub fn new(key: impl Into<String>, value: impl Into<String>, revision: Revision) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            revision,
            written_at: Utc::now(),
        }
    }

    // == Replace ==
    /// Replaces the payload, revision and write timestamp together.
    pub fn replace(&mut self, value: impl Into<String>, revision: Revision) {
        self.value = value.into();
        self.revision = revision;
        self.written_at = Utc::now();
    }
}
