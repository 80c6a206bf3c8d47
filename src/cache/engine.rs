//! Cache Engine Module
//!
//! Owns the entry map and the order tracker, enforces capacity through the
//! configured eviction policy and applies lazy expiry on read. Every public
//! operation runs under one mutex so the map and the tracker are never seen
//! half-updated.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{
    CacheEntry, CacheStats, Clock, EvictionPolicy, EvictionPolicyKind, OrderTracker, SystemClock,
    MAX_KEY_LENGTH, MAX_VALUE_SIZE,
};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache State ==
/// Store and order tracker, always mutated together under the engine lock.
#[derive(Debug)]
struct CacheState {
    store: HashMap<String, CacheEntry>,
    order: OrderTracker,
    stats: CacheStats,
}

impl CacheState {
    fn new(capacity: usize) -> Self {
        Self {
            store: HashMap::new(),
            order: OrderTracker::new(),
            stats: CacheStats::new(capacity),
        }
    }

    /// Inserts a new key or refreshes an existing one.
    ///
    /// Returns true if the key was new.
    fn insert_or_update(
        &mut self,
        policy: &dyn EvictionPolicy,
        key: String,
        value: String,
        ttl: u64,
        now: i64,
    ) -> bool {
        if let Some(entry) = self.store.get_mut(&key) {
            entry.refresh(value, ttl, now);
            policy.on_access(&mut self.order, &key);
            return false;
        }

        policy.on_insert(&mut self.order, &key);
        self.store.insert(key, CacheEntry::new(value, ttl, now));
        true
    }

    fn touch(&mut self, policy: &dyn EvictionPolicy, key: &str) {
        policy.on_access(&mut self.order, key);
    }

    /// Drops a key from both the store and the tracker.
    fn remove(&mut self, key: &str) -> bool {
        let removed = self.store.remove(key).is_some();
        let tracked = self.order.remove(key);
        debug_assert_eq!(removed, tracked, "store and order disagree on {key:?}");
        removed
    }

    fn front_candidate<'a>(&'a self, policy: &dyn EvictionPolicy) -> Option<&'a str> {
        policy.select_victim(&self.order)
    }

    /// Evicts until the store fits `capacity`, returning the evicted keys.
    fn enforce_capacity(&mut self, policy: &dyn EvictionPolicy, capacity: usize) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.store.len() > capacity {
            let Some(victim) = self.front_candidate(policy).map(str::to_owned) else {
                unreachable!(
                    "order tracker is empty while the store holds {} entries",
                    self.store.len()
                );
            };
            self.remove(&victim);
            self.stats.record_eviction();
            evicted.push(victim);
        }
        evicted
    }

    fn check_invariants(&self) {
        debug_assert_eq!(self.store.len(), self.order.len());
        debug_assert!(self.order.iter().all(|key| self.store.contains_key(key)));
    }
}

// == Cache Engine ==
/// Thread-safe key-value cache with TTL expiry and bounded capacity.
#[derive(Debug)]
pub struct CacheEngine {
    state: Mutex<CacheState>,
    policy: Box<dyn EvictionPolicy>,
    capacity: usize,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
    clock: Arc<dyn Clock>,
}

impl CacheEngine {
    /// Capacity used when none is configured.
    pub const DEFAULT_CAPACITY: usize = 1024;
    /// TTL in seconds used when none is configured.
    pub const DEFAULT_TTL: u64 = 3600;

    // == Constructors ==
    /// Creates an engine from a policy name (`"FIFO"` or `"LRU"`).
    ///
    /// Fails with [`CacheError::Config`] on an unknown name or a zero
    /// capacity; no engine is built in that case.
    pub fn new(policy: &str, capacity: usize, default_ttl: u64) -> Result<Self> {
        Self::with_policy(policy.parse()?, capacity, default_ttl)
    }

    pub fn with_policy(
        kind: EvictionPolicyKind,
        capacity: usize,
        default_ttl: u64,
    ) -> Result<Self> {
        Self::with_clock(kind, capacity, default_ttl, Arc::new(SystemClock))
    }

    /// Creates an engine reading time from `clock`.
    pub fn with_clock(
        kind: EvictionPolicyKind,
        capacity: usize,
        default_ttl: u64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::Config(
                "Capacity must be at least 1".to_string(),
            ));
        }

        info!(
            "Cache engine created: policy={}, capacity={}, default_ttl={}s",
            kind, capacity, default_ttl
        );

        Ok(Self {
            state: Mutex::new(CacheState::new(capacity)),
            policy: kind.build(),
            capacity,
            default_ttl,
            clock,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.eviction_policy, config.capacity, config.default_ttl)
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` if the key is absent or expired. An expired entry is
    /// purged from the store and the tracker before returning.
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_with_ttl(key).map(|(value, _)| value)
    }

    /// Like [`CacheEngine::get`], also returning the seconds left before the
    /// entry expires.
    pub fn get_with_ttl(&self, key: &str) -> Option<(String, u64)> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let Some(expired) = state.store.get(key).map(|entry| entry.is_expired_at(now)) else {
            state.stats.record_miss();
            debug!("Cache miss: key={}", key);
            return None;
        };

        if expired {
            state.remove(key);
            state.stats.record_expiration();
            state.stats.record_miss();
            state.check_invariants();
            debug!("Cache entry expired: key={}", key);
            return None;
        }

        state.touch(self.policy.as_ref(), key);
        state.stats.record_hit();
        debug!("Cache hit: key={}", key);
        state
            .store
            .get(key)
            .map(|entry| (entry.value.clone(), entry.ttl_remaining(now)))
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// An existing key is refreshed in place and never triggers eviction. A
    /// new key that pushes the store over capacity evicts the policy's victim.
    ///
    /// # Arguments
    /// * `key` - The key to store (non-empty)
    /// * `value` - The value to store (non-empty)
    /// * `ttl` - Optional TTL in seconds (uses default_ttl if None)
    pub fn set(&self, key: String, value: String, ttl: Option<u64>) -> Result<()> {
        validate(&key, &value)?;

        let ttl = ttl.unwrap_or(self.default_ttl);
        let now = self.clock.now();
        let mut state = self.state.lock();

        let inserted = state.insert_or_update(self.policy.as_ref(), key.clone(), value, ttl, now);
        if inserted {
            for victim in state.enforce_capacity(self.policy.as_ref(), self.capacity) {
                debug!("Evicted entry: key={}, policy={}", victim, self.policy.kind());
            }
            debug!("Created entry: key={}, ttl={}s", key, ttl);
        } else {
            debug!("Updated entry: key={}, ttl={}s", key, ttl);
        }

        let len = state.store.len();
        state.stats.set_total_entries(len);
        state.check_invariants();
        Ok(())
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Deleting an absent key is a no-op. Returns whether an entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut state = self.state.lock();
        let removed = state.remove(key);
        if removed {
            let len = state.store.len();
            state.stats.set_total_entries(len);
            debug!("Deleted entry: key={}", key);
        } else {
            debug!("Delete of absent key: key={}", key);
        }
        state.check_invariants();
        removed
    }

    // == Clear ==
    /// Empties the store and the tracker. Capacity and policy are unchanged.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.store.clear();
        state.order.clear();
        state.stats.set_total_entries(0);
        debug!("Cache cleared");
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.store.len());
        stats
    }

    // == Inspection ==
    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().store.is_empty()
    }

    /// Whether a key is physically present. Neither purges nor reorders.
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().store.contains_key(key)
    }

    /// Snapshot of the keys in eviction order, next victim first.
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().order.iter().map(str::to_owned).collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicyKind {
        self.policy.kind()
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }
}

/// Rejects malformed input before any state is touched.
fn validate(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if value.is_empty() {
        return Err(CacheError::InvalidRequest(
            "Value cannot be empty".to_string(),
        ));
    }
    if value.len() > MAX_VALUE_SIZE {
        return Err(CacheError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    const START: i64 = 1_700_000_000;

    fn engine(kind: EvictionPolicyKind, capacity: usize) -> (CacheEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let engine = CacheEngine::with_clock(kind, capacity, 300, clock.clone()).unwrap();
        (engine, clock)
    }

    fn set(engine: &CacheEngine, key: &str, value: &str) {
        engine
            .set(key.to_string(), value.to_string(), None)
            .unwrap();
    }

    #[test]
    fn test_engine_new() {
        let engine = CacheEngine::new("FIFO", 100, 300).unwrap();
        assert_eq!(engine.len(), 0);
        assert!(engine.is_empty());
        assert_eq!(engine.capacity(), 100);
        assert_eq!(engine.policy(), EvictionPolicyKind::Fifo);
        assert_eq!(engine.default_ttl(), 300);
    }

    #[test]
    fn test_engine_unknown_policy() {
        let result = CacheEngine::new("RANDOM", 100, 300);
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_engine_zero_capacity() {
        let result = CacheEngine::new("LRU", 0, 300);
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_engine_from_config() {
        let config = Config {
            capacity: 8,
            eviction_policy: "LRU".to_string(),
            ..Config::default()
        };
        let engine = CacheEngine::from_config(&config).unwrap();
        assert_eq!(engine.capacity(), 8);
        assert_eq!(engine.policy(), EvictionPolicyKind::Lru);
    }

    #[test]
    fn test_set_and_get() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 100);

        set(&engine, "key1", "value1");

        assert_eq!(engine.get("key1"), Some("value1".to_string()));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 100);
        assert_eq!(engine.get("nonexistent"), None);
    }

    #[test]
    fn test_empty_value_rejected_without_mutation() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 100);
        set(&engine, "key1", "value1");

        let result = engine.set("key1".to_string(), String::new(), None);

        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
        assert_eq!(engine.get("key1"), Some("value1".to_string()));
    }

    #[test]
    fn test_empty_key_rejected() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 100);
        let result = engine.set(String::new(), "value".to_string(), None);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_key_too_long() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 100);
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = engine.set(long_key, "value".to_string(), None);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_value_too_large() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 100);
        let large_value = "x".repeat(MAX_VALUE_SIZE + 1);

        let result = engine.set("key".to_string(), large_value, None);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_overwrite_in_place() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 2);

        set(&engine, "key1", "value1");
        set(&engine, "key2", "value2");
        set(&engine, "key1", "value3");

        assert_eq!(engine.len(), 2);
        assert_eq!(engine.stats().evictions, 0);
        assert_eq!(engine.get("key1"), Some("value3".to_string()));
        assert_eq!(engine.get("key2"), Some("value2".to_string()));
    }

    #[test]
    fn test_fifo_eviction_scenario() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 2);

        set(&engine, "k1", "v1");
        set(&engine, "k2", "v2");
        set(&engine, "k3", "v3");

        assert_eq!(engine.get("k1"), None);
        assert_eq!(engine.get("k2"), Some("v2".to_string()));
        assert_eq!(engine.get("k3"), Some("v3".to_string()));
        assert_eq!(engine.stats().evictions, 1);
    }

    #[test]
    fn test_fifo_ignores_reads() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 2);

        set(&engine, "a", "1");
        set(&engine, "b", "2");
        engine.get("a");
        set(&engine, "c", "3");

        assert_eq!(engine.get("a"), None);
        assert!(engine.get("b").is_some());
    }

    #[test]
    fn test_fifo_update_keeps_position() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 2);

        set(&engine, "a", "1");
        set(&engine, "b", "2");
        set(&engine, "a", "updated");
        set(&engine, "c", "3");

        assert_eq!(engine.get("a"), None);
        assert_eq!(engine.keys(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_lru_touch_on_get() {
        let (engine, _) = engine(EvictionPolicyKind::Lru, 2);

        set(&engine, "a", "1");
        set(&engine, "b", "2");
        engine.get("a").unwrap();
        set(&engine, "c", "3");

        assert_eq!(engine.get("b"), None);
        assert_eq!(engine.get("a"), Some("1".to_string()));
        assert_eq!(engine.get("c"), Some("3".to_string()));
    }

    #[test]
    fn test_lru_update_promotes_key() {
        let (engine, _) = engine(EvictionPolicyKind::Lru, 2);

        set(&engine, "a", "1");
        set(&engine, "b", "2");
        set(&engine, "a", "1");
        set(&engine, "c", "3");

        assert!(engine.contains("a"));
        assert!(!engine.contains("b"));
    }

    #[test]
    fn test_ttl_expiration_is_lazy() {
        let (engine, clock) = engine(EvictionPolicyKind::Fifo, 100);

        engine
            .set("key1".to_string(), "value1".to_string(), Some(10))
            .unwrap();
        clock.advance(10);
        assert_eq!(engine.get("key1"), Some("value1".to_string()));

        clock.advance(1);
        // Still physically present until a read discovers it
        assert!(engine.contains("key1"));
        assert_eq!(engine.len(), 1);

        assert_eq!(engine.get("key1"), None);
        assert!(!engine.contains("key1"));
        assert!(engine.keys().is_empty());

        let stats = engine.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_expired_entries_count_toward_capacity() {
        let (engine, clock) = engine(EvictionPolicyKind::Fifo, 2);

        engine.set("old".to_string(), "v".to_string(), Some(1)).unwrap();
        clock.advance(5);
        set(&engine, "b", "2");
        set(&engine, "c", "3");

        // "old" was still occupying a slot and was evicted, not expired
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.stats().evictions, 1);
        assert_eq!(engine.stats().expirations, 0);
    }

    #[test]
    fn test_get_with_ttl_reports_remaining_seconds() {
        let (engine, clock) = engine(EvictionPolicyKind::Lru, 10);

        engine.set("k".to_string(), "v".to_string(), Some(30)).unwrap();
        assert_eq!(engine.get_with_ttl("k"), Some(("v".to_string(), 30)));

        clock.advance(25);
        assert_eq!(engine.get_with_ttl("k"), Some(("v".to_string(), 5)));

        clock.advance(5);
        assert_eq!(engine.get_with_ttl("k"), Some(("v".to_string(), 0)));

        clock.advance(1);
        assert_eq!(engine.get_with_ttl("k"), None);
        assert_eq!(engine.stats().expirations, 1);
    }

    #[test]
    fn test_reset_refreshes_ttl() {
        let (engine, clock) = engine(EvictionPolicyKind::Fifo, 10);

        engine.set("k".to_string(), "v".to_string(), Some(5)).unwrap();
        clock.advance(4);
        engine.set("k".to_string(), "v".to_string(), Some(5)).unwrap();
        clock.advance(4);

        assert_eq!(engine.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_default_ttl_applies() {
        let (engine, clock) = engine(EvictionPolicyKind::Fifo, 10);

        set(&engine, "k", "v");
        clock.advance(300);
        assert!(engine.get("k").is_some());
        clock.advance(1);
        assert!(engine.get("k").is_none());
    }

    #[test]
    fn test_delete_idempotent() {
        let (engine, _) = engine(EvictionPolicyKind::Lru, 10);
        set(&engine, "key1", "value1");

        assert!(engine.delete("key1"));
        assert!(!engine.delete("key1"));
        assert!(!engine.delete("never_set"));
        assert!(engine.is_empty());
        assert_eq!(engine.get("key1"), None);
    }

    #[test]
    fn test_clear_resets_entries_not_config() {
        let (engine, _) = engine(EvictionPolicyKind::Fifo, 2);
        set(&engine, "a", "1");
        set(&engine, "b", "2");

        engine.clear();

        assert!(engine.is_empty());
        assert_eq!(engine.get("a"), None);
        assert_eq!(engine.capacity(), 2);
        assert_eq!(engine.policy(), EvictionPolicyKind::Fifo);

        set(&engine, "c", "3");
        set(&engine, "d", "4");
        assert_eq!(engine.stats().evictions, 0);
        set(&engine, "e", "5");
        assert_eq!(engine.stats().evictions, 1);
        assert_eq!(engine.get("c"), None);
    }

    #[test]
    fn test_stats() {
        let (engine, _) = engine(EvictionPolicyKind::Lru, 100);

        set(&engine, "key1", "value1");
        engine.get("key1").unwrap();
        let _ = engine.get("nonexistent");

        let stats = engine.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.capacity, 100);
    }
}
