//! The contract both containers offer to the record reader and the REPL.

use crate::error::KeyNotFound;

/// Insert-only associative container.
///
/// Implemented by [`crate::ChainedHashMap`] and [`crate::RedBlackTreeMap`];
/// code written against this trait runs unchanged on either backend.
pub trait KeyedMap<K, V> {
    /// Stores `value` under `key`. Returns `true` if `key` was absent; an
    /// existing key keeps its entry and only has its value replaced.
    fn insert(&mut self, key: K, value: V) -> bool;

    fn search(&self, key: &K) -> Result<&V, KeyNotFound>;

    fn search_mut(&mut self, key: &K) -> Result<&mut V, KeyNotFound>;

    fn contains(&self, key: &K) -> bool;

    /// Number of distinct keys ever inserted.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
