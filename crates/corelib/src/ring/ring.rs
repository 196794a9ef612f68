//! Hash ring data structure.
//!
//! A `BTreeMap` from token to value gives O(log n) insert and successor
//! lookup. The map is treated as a circle: a key greater than every stored
//! token wraps around to the smallest one.

use std::collections::btree_map::{self, BTreeMap};
use std::ops::Bound;

use crate::token::Token;

/// Ordered mapping from ring token to the value (server) that owns it.
///
/// Generic over the token and value types so lookups return typed entries
/// directly.
#[derive(Debug, Clone)]
pub struct HashRing<T: Token, V> {
    entries: BTreeMap<T, V>,
}

impl<T: Token, V> Default for HashRing<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token, V> HashRing<T, V> {
    /// Create an empty ring.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert an entry, returning the value previously bound to `token`.
    ///
    /// A colliding token overwrites the earlier entry.
    pub fn insert(&mut self, token: T, value: V) -> Option<V> {
        self.entries.insert(token, value)
    }

    /// The value owning `token`: the entry at the smallest key `>= token`,
    /// wrapping to the smallest key overall. `None` on an empty ring.
    pub fn successor(&self, token: &T) -> Option<&V> {
        self.successor_entry(token).map(|(_, value)| value)
    }

    /// Like [`successor`](Self::successor) but also returns the matched key.
    pub fn successor_entry(&self, token: &T) -> Option<(&T, &V)> {
        self.entries
            .range((Bound::Included(token), Bound::Unbounded))
            .next()
            .or_else(|| self.entries.iter().next())
    }

    /// Entries in ascending token order.
    pub fn iter(&self) -> btree_map::Iter<'_, T, V> {
        self.entries.iter()
    }

    /// Number of entries (virtual nodes) on the ring.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Token, V: PartialEq> HashRing<T, V> {
    /// Number of entries bound to `value`.
    pub fn count_for(&self, value: &V) -> usize {
        self.entries.values().filter(|v| *v == value).count()
    }
}

impl<'a, T: Token, V> IntoIterator for &'a HashRing<T, V> {
    type Item = (&'a T, &'a V);
    type IntoIter = btree_map::Iter<'a, T, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
