//! Cache Limits
//!
//! Optional upper bounds on key length and payload size.

use crate::cache::CacheKey;
use crate::error::{CacheError, Result};

/// Default maximum key length in bytes
pub const DEFAULT_MAX_KEY_LENGTH: usize = 256;

/// Default maximum serialized value size in bytes
pub const DEFAULT_MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

// == Cache Limits ==
/// Size bounds applied before anything reaches a backend.
///
/// `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub max_key_length: Option<usize>,
    pub max_value_size: Option<usize>,
}

impl CacheLimits {
    /// No bounds at all: every non-blank key and every payload is accepted.
    pub fn unbounded() -> Self {
        Self {
            max_key_length: None,
            max_value_size: None,
        }
    }

    /// Rejects keys longer than `max_key_length` bytes.
    pub fn check_key(&self, key: &CacheKey) -> Result<()> {
        match self.max_key_length {
            Some(max) if key.as_str().len() > max => Err(CacheError::Validation(format!(
                "Key exceeds maximum length of {} bytes",
                max
            ))),
            _ => Ok(()),
        }
    }

    /// Rejects payloads over `max_value_size` bytes.
    pub fn check_payload(&self, payload: &str) -> Result<()> {
        match self.max_value_size {
            Some(max) if payload.len() > max => Err(CacheError::Validation(format!(
                "Value exceeds maximum size of {} bytes",
                max
            ))),
            _ => Ok(()),
        }
    }
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            max_key_length: Some(DEFAULT_MAX_KEY_LENGTH),
            max_value_size: Some(DEFAULT_MAX_VALUE_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> CacheKey {
        CacheKey::parse(raw).unwrap()
    }

    #[test]
    fn test_default_key_limit() {
        let limits = CacheLimits::default();

        assert!(limits.check_key(&key(&"x".repeat(DEFAULT_MAX_KEY_LENGTH))).is_ok());
        assert!(matches!(
            limits.check_key(&key(&"x".repeat(DEFAULT_MAX_KEY_LENGTH + 1))),
            Err(CacheError::Validation(_))
        ));
    }

    #[test]
    fn test_default_value_limit() {
        let limits = CacheLimits::default();

        assert!(limits.check_payload("{}").is_ok());
        assert!(matches!(
            limits.check_payload(&"x".repeat(DEFAULT_MAX_VALUE_SIZE + 1)),
            Err(CacheError::Validation(_))
        ));
    }

    #[test]
    fn test_custom_limits() {
        let limits = CacheLimits {
            max_key_length: Some(4),
            max_value_size: Some(2),
        };

        assert!(limits.check_key(&key("abcd")).is_ok());
        assert!(limits.check_key(&key("abcde")).is_err());
        assert!(limits.check_payload("[]").is_ok());
        assert!(limits.check_payload("[1]").is_err());
    }

    #[test]
    fn test_unbounded_accepts_anything() {
        let limits = CacheLimits::unbounded();

        assert!(limits.check_key(&key(&"x".repeat(64 * 1024))).is_ok());
        assert!(limits
            .check_payload(&"x".repeat(DEFAULT_MAX_VALUE_SIZE * 2))
            .is_ok());
    }
}
