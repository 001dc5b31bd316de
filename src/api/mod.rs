//! API Module
//!
//! HTTP handlers and routing for the demo profile service and cache administration.
//!
//! # Endpoints
//! - `GET|POST /api/profiles` - List or create profiles (reads cached)
//! - `GET|PUT|DELETE /api/profiles/:id` - Read, replace or delete a profile (reads cached)
//! - `GET /cache/stats` - Cache statistics
//! - `GET /cache/keys` - Live cache keys
//! - `DELETE /cache` - Flush the cache
//! - `POST /cache/invalidate` - Invalidate matching entries
//! - `GET /health` - Health check endpoint

pub mod directory;
pub mod handlers;
pub mod routes;

pub use directory::ProfileDirectory;
pub use handlers::*;
pub use routes::{create_router, PROFILES_PREFIX};
