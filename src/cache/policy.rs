//! Eviction Policy Module
//!
//! Strategies deciding how the order tracker is updated and which key is
//! evicted when the store goes over capacity. The policy is chosen once,
//! when the engine is built, from [`EvictionPolicyKind`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::OrderTracker;
use crate::error::CacheError;

// == Eviction Policy Trait ==
/// Contract every eviction strategy implements.
///
/// New keys always enter at the newest end of the tracker and victims are
/// always taken from the eviction end; strategies differ in how reads move
/// keys around.
pub trait EvictionPolicy: Send + Sync + fmt::Debug {
    /// Which variant this is.
    fn kind(&self) -> EvictionPolicyKind;

    /// Records a freshly inserted key.
    fn on_insert(&self, order: &mut OrderTracker, key: &str) {
        order.push_back(key);
    }

    /// Records a successful read, or a re-insert of an existing key.
    fn on_access(&self, order: &mut OrderTracker, key: &str);

    /// Picks the next key to evict without removing it.
    fn select_victim<'a>(&self, order: &'a OrderTracker) -> Option<&'a str> {
        order.front()
    }
}

// == FIFO ==
/// First in, first out: reads never change the eviction order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FifoPolicy;

impl EvictionPolicy for FifoPolicy {
    fn kind(&self) -> EvictionPolicyKind {
        EvictionPolicyKind::Fifo
    }

    fn on_access(&self, _order: &mut OrderTracker, _key: &str) {}
}

// == LRU ==
/// Least recently used: every access moves the key to the newest end.
#[derive(Debug, Default, Clone, Copy)]
pub struct LruPolicy;

impl EvictionPolicy for LruPolicy {
    fn kind(&self) -> EvictionPolicyKind {
        EvictionPolicyKind::Lru
    }

    fn on_access(&self, order: &mut OrderTracker, key: &str) {
        order.move_to_back(key);
    }
}

// == Policy Kind ==
/// Name-level selection of an eviction policy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvictionPolicyKind {
    #[default]
    Fifo,
    Lru,
}

impl EvictionPolicyKind {
    /// Builds the concrete policy for this variant.
    pub fn build(self) -> Box<dyn EvictionPolicy> {
        match self {
            EvictionPolicyKind::Fifo => Box::new(FifoPolicy),
            EvictionPolicyKind::Lru => Box::new(LruPolicy),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EvictionPolicyKind::Fifo => "FIFO",
            EvictionPolicyKind::Lru => "LRU",
        }
    }
}

impl fmt::Display for EvictionPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicyKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FIFO" => Ok(EvictionPolicyKind::Fifo),
            "LRU" => Ok(EvictionPolicyKind::Lru),
            _ => Err(CacheError::Config(format!(
                "Unknown eviction policy: {:?} (expected \"FIFO\" or \"LRU\")",
                s
            ))),
        }
    }
}
