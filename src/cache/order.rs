//! Order Tracker Module
//!
//! Ordered sequence of keys used to pick eviction victims.
//!
//! Keys live in a doubly-linked list whose nodes are stored in a slot arena:
//! - Front = eviction end (oldest / least recently used)
//! - Back = newest / most recently used
//!
//! A key -> slot index makes every operation O(1).

use std::collections::HashMap;

#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Order Tracker ==
#[derive(Debug, Default)]
pub struct OrderTracker {
    /// Key -> slot in `nodes`
    index: HashMap<String, usize>,
    /// Slot arena; `None` marks a free slot
    nodes: Vec<Option<Node>>,
    /// Reusable slots
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl OrderTracker {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Push Back ==
    /// Appends a key at the newest end.
    ///
    /// A key that is already tracked is moved to the back instead, so a key
    /// never appears twice.
    pub fn push_back(&mut self, key: &str) {
        if self.move_to_back(key) {
            return;
        }

        let node = Node {
            key: key.to_string(),
            prev: self.tail,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.node_mut(tail).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.index.insert(key.to_string(), idx);
    }

    // == Move To Back ==
    /// Moves a tracked key to the newest end.
    ///
    /// Returns false if the key is not tracked.
    pub fn move_to_back(&mut self, key: &str) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        if self.tail == Some(idx) {
            return true;
        }

        self.unlink(idx);
        let old_tail = self.tail;
        let node = self.node_mut(idx);
        node.prev = old_tail;
        node.next = None;

        match old_tail {
            Some(tail) => self.node_mut(tail).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        true
    }

    // == Remove ==
    /// Removes a key from the tracker. Returns false if it was not tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(idx) = self.index.remove(key) else {
            return false;
        };
        self.unlink(idx);
        self.nodes[idx] = None;
        self.free.push(idx);
        true
    }

    // == Front ==
    /// Returns the key at the eviction end without removing it.
    pub fn front(&self) -> Option<&str> {
        self.head
            .and_then(|idx| self.nodes[idx].as_ref())
            .map(|node| node.key.as_str())
    }

    // == Contains ==
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    // == Iter ==
    /// Iterates keys from the eviction end to the newest end.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.nodes[cursor?].as_ref()?;
            cursor = node.next;
            Some(node.key.as_str())
        })
    }

    /// Detaches a slot from its neighbours, patching head/tail.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node_mut(idx);
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.tail = prev,
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node {
        match self.nodes[idx].as_mut() {
            Some(node) => node,
            None => unreachable!("order tracker slot {idx} is linked but empty"),
        }
    }
}
