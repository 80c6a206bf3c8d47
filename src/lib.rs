//! Mini Cache - An in-memory key-value cache
//!
//! Entries expire lazily after their TTL and capacity is enforced by a FIFO
//! or LRU eviction policy chosen at construction.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{CacheEngine, EvictionPolicyKind};
pub use config::Config;
pub use error::CacheError;
