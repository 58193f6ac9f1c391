//! Id-indexed arena for monotonic registries.
//!
//! Rounds, detection periods and settlements are all keyed by ids that start
//! at 1 and increase by exactly 1. Storing them in a deque indexed by
//! `id - base` keeps lookup O(1), makes iteration ordered, and lets old
//! entries be pruned from the front explicitly.
//!
//! # Example
//!
//! ```rust
//! use warden_core::arena::{IdArena, Slot};
//!
//! let mut arena = IdArena::new();
//! let a = arena.push("round one");
//! let b = arena.push("round two");
//! assert_eq!((a, b), (1, 2));
//!
//! arena.prune_before(2);
//! assert_eq!(arena.slot(1), Slot::Pruned);
//! assert_eq!(arena.slot(2), Slot::Live(&"round two"));
//! assert_eq!(arena.slot(3), Slot::Vacant);
//! ```

use std::collections::VecDeque;

/// Lookup result distinguishing pruned ids from ids never allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a, T> {
    /// The entry exists.
    Live(&'a T),
    /// The entry existed but was pruned.
    Pruned,
    /// The id was never allocated (zero or in the future).
    Vacant,
}

/// Arena of entries addressed by 1-based monotonic ids.
#[derive(Debug, Clone)]
pub struct IdArena<T> {
    /// Id of `items[0]`.
    base: u64,
    items: VecDeque<T>,
}

impl<T> Default for IdArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IdArena<T> {
    /// Create an empty arena; the first id handed out is 1.
    pub fn new() -> Self {
        Self {
            base: 1,
            items: VecDeque::new(),
        }
    }

    /// Append an entry and return its id.
    pub fn push(&mut self, item: T) -> u64 {
        self.items.push_back(item);
        self.last_id()
    }

    /// Id the next push will receive.
    pub fn next_id(&self) -> u64 {
        self.base + self.items.len() as u64
    }

    /// Id of the most recent entry (0 if nothing was ever pushed).
    pub fn last_id(&self) -> u64 {
        self.next_id() - 1
    }

    /// Lowest id still held.
    pub fn first_live_id(&self) -> u64 {
        self.base
    }

    /// Look up an id.
    pub fn slot(&self, id: u64) -> Slot<'_, T> {
        if id == 0 || id >= self.next_id() {
            Slot::Vacant
        } else if id < self.base {
            Slot::Pruned
        } else {
            Slot::Live(&self.items[(id - self.base) as usize])
        }
    }

    /// Get a live entry.
    pub fn get(&self, id: u64) -> Option<&T> {
        match self.slot(id) {
            Slot::Live(item) => Some(item),
            _ => None,
        }
    }

    /// Get a live entry mutably.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        if id < self.base || id >= self.next_id() {
            return None;
        }
        self.items.get_mut((id - self.base) as usize)
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Most recent entry, mutably.
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.items.back_mut()
    }

    /// Drop every entry with id below `id`. Returns how many were dropped.
    ///
    /// Ids are never reused: pruning only moves the base forward.
    pub fn prune_before(&mut self, id: u64) -> usize {
        let cutoff = id.min(self.next_id());
        let mut dropped = 0;
        while self.base < cutoff {
            self.items.pop_front();
            self.base += 1;
            dropped += 1;
        }
        dropped
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if no entry is live.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate live entries with their ids, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> {
        let base = self.base;
        self.items
            .iter()
            .enumerate()
            .map(move |(i, item)| (base + i as u64, item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one() {
        let mut arena = IdArena::new();
        assert_eq!(arena.last_id(), 0);
        assert_eq!(arena.push('a'), 1);
        assert_eq!(arena.push('b'), 2);
        assert_eq!(arena.get(1), Some(&'a'));
        assert_eq!(arena.slot(0), Slot::Vacant);
        assert_eq!(arena.slot(3), Slot::Vacant);
    }

    #[test]
    fn test_prune_keeps_ids_stable() {
        let mut arena = IdArena::new();
        for i in 0..5 {
            arena.push(i);
        }
        assert_eq!(arena.prune_before(3), 2);
        assert_eq!(arena.slot(2), Slot::Pruned);
        assert_eq!(arena.get(3), Some(&2));
        assert_eq!(arena.push(99), 6);
        assert_eq!(arena.first_live_id(), 3);

        let ids: Vec<u64> = arena.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_prune_beyond_end_is_bounded() {
        let mut arena = IdArena::new();
        arena.push(1);
        arena.push(2);
        assert_eq!(arena.prune_before(100), 2);
        assert!(arena.is_empty());
        assert_eq!(arena.push(3), 3);
    }

    #[test]
    fn test_get_mut() {
        let mut arena = IdArena::new();
        arena.push(1);
        *arena.get_mut(1).unwrap() = 10;
        assert_eq!(arena.get(1), Some(&10));
        assert!(arena.get_mut(2).is_none());
        *arena.last_mut().unwrap() += 1;
        assert_eq!(arena.last(), Some(&11));
    }
}
