//! Cache Key Module
//!
//! Validation for caller-supplied keys.

use std::fmt;

use crate::error::{CacheError, Result};

// == Cache Key ==
/// A validated, opaque cache key.
///
/// Validation trims whitespace to decide emptiness, but the key is kept
/// exactly as supplied: `" a"` and `"a"` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Validates a raw key.
    ///
    /// Fails with [`CacheError::Validation`] when the key is empty or
    /// whitespace-only. Length bounds are a [`CacheLimits`] concern.
    ///
    /// [`CacheLimits`]: crate::cache::CacheLimits
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CacheError::Validation("Key is required".to_string()));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
