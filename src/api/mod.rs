//! API Module
//!
//! HTTP handlers and routing for the cache service REST API.
//!
//! # Endpoints
//! - `POST /api/v1/store` - Store a JSON value under a key
//! - `GET /api/v1/retrieve/:key` - Retrieve a JSON value by key
//! - `POST /cache/:key?value=` - Store an opaque string
//! - `GET /cache/:key` - Retrieve an opaque string
//! - `GET /health` - Composite backend health

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
