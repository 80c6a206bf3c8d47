//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// A stored value plus its absolute expiration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl_seconds` after `now`.
    pub fn new(value: String, ttl_seconds: u64, now: i64) -> Self {
        Self {
            value,
            expires_at: expiry_from(now, ttl_seconds),
        }
    }

    // == Refresh ==
    /// Overwrites the value and restarts the TTL from `now`.
    pub fn refresh(&mut self, value: String, ttl_seconds: u64, now: i64) {
        self.value = value;
        self.expires_at = expiry_from(now, ttl_seconds);
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// The entry stays live through the second named by `expires_at` and is
    /// expired strictly after it.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in seconds, 0 once expired.
    pub fn ttl_remaining(&self, now: i64) -> u64 {
        u64::try_from(self.expires_at.saturating_sub(now)).unwrap_or(0)
    }
}

fn expiry_from(now: i64, ttl_seconds: u64) -> i64 {
    now.saturating_add(i64::try_from(ttl_seconds).unwrap_or(i64::MAX))
}
