//! Bounded history: an ordered, size-capped sequence with FIFO eviction.
//!
//! Used for settled work records and for the tracker's event log. Append
//! past capacity evicts the oldest entries; reads never mutate the store.
//!
//! Ordering conventions are deliberate and fixed: `list` surfaces the
//! most recent entries first (dashboard reads), `find` scans oldest-first
//! (locating the original record).

use std::collections::VecDeque;

/// An append-and-truncate list capped at a fixed capacity.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Create a store with a fixed capacity. Capacity zero is legal and
    /// means "never retain history": every append immediately evicts.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append to the end, evicting from the front past capacity.
    pub fn append(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    /// Most recent entries first, optionally limited.
    pub fn list(&self, limit: Option<usize>) -> Vec<&T> {
        self.list_where(limit, |_| true)
    }

    /// Most recent entries first, filtered, then limited to the first
    /// `limit` matches.
    pub fn list_where(&self, limit: Option<usize>, predicate: impl Fn(&T) -> bool) -> Vec<&T> {
        let matches = self.items.iter().rev().filter(|item| predicate(item));
        match limit {
            Some(n) => matches.take(n).collect(),
            None => matches.collect(),
        }
    }

    /// First match in insertion order (oldest first).
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|item| predicate(item))
    }

    /// Iterate in insertion order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
