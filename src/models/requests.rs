//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::{Deserialize, Deserializer};

use crate::cache::CacheValue;
use crate::error::{CacheError, Result};

/// Request body for the store operation (POST /api/v1/store)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value. An explicit `null` is a value; a missing
///   field is not.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRequest {
    /// The cache key
    #[serde(default)]
    pub key: String,
    /// The value to store, `None` when the field is absent
    #[serde(default, deserialize_with = "present")]
    pub value: Option<CacheValue>,
}

/// Maps any present value, `null` included, to `Some`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<CacheValue>, D::Error>
where
    D: Deserializer<'de>,
{
    CacheValue::deserialize(deserializer).map(Some)
}

impl StoreRequest {
    /// Validates the request data and splits it into key and value.
    ///
    /// Key rules are enforced again by the service.
    pub fn into_parts(self) -> Result<(String, CacheValue)> {
        if self.key.trim().is_empty() {
            return Err(CacheError::Validation("Key is required".to_string()));
        }
        let value = self
            .value
            .ok_or_else(|| CacheError::Validation("Value is required".to_string()))?;
        Ok((self.key, value))
    }
}

/// Query string for the opaque-string store (POST /cache/:key?value=...)
#[derive(Debug, Clone, Deserialize)]
pub struct RawStoreQuery {
    #[serde(default)]
    pub value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_request_deserialize() {
        let json = r#"{"key": "user:42", "value": {"name": "Ada"}}"#;
        let req: StoreRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "user:42");
        assert_eq!(req.value, Some(json!({"name": "Ada"})));
    }

    #[test]
    fn test_explicit_null_is_a_value() {
        let json = r#"{"key": "k", "value": null}"#;
        let req: StoreRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.value, Some(CacheValue::Null));
        assert!(req.into_parts().is_ok());
    }

    #[test]
    fn test_missing_value_is_rejected() {
        let req: StoreRequest = serde_json::from_str(r#"{"key": "k"}"#).unwrap();
        assert!(req.value.is_none());
        assert!(matches!(req.into_parts(), Err(CacheError::Validation(_))));
    }

    #[test]
    fn test_blank_key_is_rejected() {
        let req: StoreRequest = serde_json::from_str(r#"{"key": "  ", "value": 1}"#).unwrap();
        assert!(matches!(req.into_parts(), Err(CacheError::Validation(_))));

        let req: StoreRequest = serde_json::from_str(r#"{"value": 1}"#).unwrap();
        assert!(matches!(req.into_parts(), Err(CacheError::Validation(_))));
    }

    #[test]
    fn test_raw_store_query() {
        let query: RawStoreQuery = serde_json::from_str(r#"{"value": "hello"}"#).unwrap();
        assert_eq!(query.value.as_deref(), Some("hello"));

        let query: RawStoreQuery = serde_json::from_str("{}").unwrap();
        assert!(query.value.is_none());
    }
}
