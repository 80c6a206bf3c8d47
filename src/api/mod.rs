//! API Module
//!
//! Thin HTTP adapter over the cache engine.
//!
//! # Endpoints
//! - `GET /get/:key` - Retrieve a value by key
//! - `PUT|POST /set/:key` - Store a value under a key
//! - `DELETE /delete/:key` - Delete a key
//! - `DELETE /clear` - Drop every entry
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
