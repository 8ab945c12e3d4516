//! Cache Module
//!
//! The cache storage abstraction: key validation, size limits, the JSON
//! codec, the stored record shape and the service that fronts one or more
//! backends.

mod codec;
mod key;
mod limits;
mod record;
mod service;


// Re-export public types
pub use codec::{decode, encode};
pub use key::CacheKey;
pub use limits::{CacheLimits, DEFAULT_MAX_KEY_LENGTH, DEFAULT_MAX_VALUE_SIZE};
pub use record::CacheRecord;
pub use service::CacheService;

/// A cached document. Any JSON value is legal, including `null` and scalars.
pub type CacheValue = serde_json::Value;
