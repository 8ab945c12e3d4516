//! JSON Cache - A key-value caching service for JSON documents
//!
//! Stores any JSON value under a string key in Postgres, Redis or process
//! memory, optionally with a front cache, and reports composite backend health.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod models;

pub use api::AppState;
pub use cache::{CacheService, CacheValue};
pub use config::Config;
pub use health::HealthAggregator;
