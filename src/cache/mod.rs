//! Cache Module
//!
//! In-memory key-value cache with lazy TTL expiry and FIFO/LRU eviction.

mod clock;
mod engine;
mod entry;
mod order;
mod policy;
mod stats;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::CacheEngine;
pub use entry::CacheEntry;
pub use order::OrderTracker;
pub use policy::{EvictionPolicy, EvictionPolicyKind, FifoPolicy, LruPolicy};
pub use stats::CacheStats;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
