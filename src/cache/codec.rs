//! JSON Codec
//!
//! Values cross the backend boundary as compact JSON text.

use crate::cache::CacheValue;
use crate::error::BackendError;

/// Serializes a value to compact JSON text.
pub fn encode(value: &CacheValue) -> Result<String, BackendError> {
    serde_json::to_string(value).map_err(|e| BackendError::Serialization(e.to_string()))
}

/// Parses stored JSON text back into a value.
///
/// Anything that is not exactly one JSON document is rejected rather than
/// partially returned.
pub fn decode(text: &str) -> Result<CacheValue, BackendError> {
    serde_json::from_str(text).map_err(|e| BackendError::Corrupt(e.to_string()))
}
