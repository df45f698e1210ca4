//! ChainedHashMap: separate chaining over a generational node arena.
//!
//! Every chain node lives in one `SlotMap`; bucket heads and `next` links are
//! arena keys, so a chain never owns its successor directly. Each node keeps
//! the `u64` hash computed when it was inserted and growth re-buckets by that
//! stored hash; `K: Hash` runs once per insert and once per uncached lookup.
//!
//! Lookup cache
//! - `last` holds the arena key of the most recently matched node.
//! - Set by every `insert` (new or overwritten key) and every successful
//!   `search`, `search_mut` or `contains`; cleared by a failed lookup.
//! - Cleared on growth, which moves all nodes into a fresh arena. Arena keys
//!   are generational, so even a key that survived by mistake could only fail
//!   to resolve, never alias another node.

use crate::config::HashMapConfig;
use crate::error::{ConfigError, KeyNotFound};
use crate::guard::BusyFlag;
use crate::keyed_map::KeyedMap;
use core::borrow::Borrow;
use core::cell::Cell;
use core::hash::{BuildHasher, Hash};
use core::mem;
use hashbrown::hash_map::DefaultHashBuilder;
use log::{debug, warn};
use slotmap::{new_key_type, SlotMap};
use std::collections::TryReserveError;

new_key_type! {
    struct ChainKey;
}

#[derive(Debug)]
struct ChainNode<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Option<ChainKey>,
}

enum Slot {
    Appended(ChainKey),
    Updated(ChainKey),
}

/// Bucket heads plus the arena that owns every node.
#[derive(Debug)]
struct ChainTable<K, V> {
    heads: Vec<Option<ChainKey>>,
    nodes: SlotMap<ChainKey, ChainNode<K, V>>,
}

impl<K, V> ChainTable<K, V> {
    fn with_buckets(bucket_count: usize) -> Self {
        Self {
            heads: vec![None; bucket_count],
            nodes: SlotMap::with_key(),
        }
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn bucket_count(&self) -> usize {
        self.heads.len()
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.heads.len() as u64) as usize
    }

    /// First node in `hash`'s chain whose key satisfies `eq`.
    fn find(&self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> Option<ChainKey> {
        let mut cursor = self.heads[self.bucket_of(hash)];
        while let Some(k) = cursor {
            let node = &self.nodes[k];
            if node.hash == hash && eq(&node.key) {
                return Some(k);
            }
            cursor = node.next;
        }
        None
    }

    /// Overwrites the value of an equal key in place, or appends a new node
    /// at the tail of the chain.
    fn upsert(&mut self, hash: u64, key: K, value: V) -> Slot
    where
        K: Eq,
    {
        let bucket = self.bucket_of(hash);
        let mut tail = None;
        let mut cursor = self.heads[bucket];
        while let Some(k) = cursor {
            let node = &mut self.nodes[k];
            if node.hash == hash && node.key == key {
                node.value = value;
                return Slot::Updated(k);
            }
            tail = Some(k);
            cursor = node.next;
        }
        let node = ChainNode {
            key,
            value,
            hash,
            next: None,
        };
        Slot::Appended(self.link(bucket, tail, node))
    }

    fn link(&mut self, bucket: usize, tail: Option<ChainKey>, node: ChainNode<K, V>) -> ChainKey {
        let k = self.nodes.insert(node);
        match tail {
            Some(t) => self.nodes[t].next = Some(k),
            None => self.heads[bucket] = Some(k),
        }
        k
    }

    /// One growth step; returns whether the nodes moved. A step that
    /// overflows or cannot be allocated is skipped, leaving the table at its
    /// current size to retry on the next new key.
    fn grow(&mut self, config: &HashMapConfig) -> bool {
        let from = self.bucket_count();
        let Some(to) = config.grown_bucket_count(from) else {
            warn!(
                "chained hash map stays at {} buckets: growth factor {} overflows",
                from, config.growth_factor
            );
            return false;
        };
        debug!(
            "growing chained hash map from {} to {} buckets ({} entries)",
            from,
            to,
            self.len()
        );
        match self.rebuild(to) {
            Ok(()) => true,
            Err(e) => {
                warn!("chained hash map stays at {} buckets: {}", from, e);
                false
            }
        }
    }

    /// Moves every entry into `bucket_count` empty buckets backed by a new
    /// arena, walking the old chains in bucket order. Keys are already
    /// unique, so reinsertion appends without comparing and never re-checks
    /// the load factor.
    ///
    /// The table is left untouched if the new bucket array cannot be
    /// allocated.
    fn rebuild(&mut self, bucket_count: usize) -> Result<(), TryReserveError> {
        let mut heads = Vec::new();
        heads.try_reserve_exact(bucket_count)?;
        heads.resize(bucket_count, None);

        let len = self.len();
        let old_heads = mem::replace(&mut self.heads, heads);
        let mut old_nodes = mem::replace(&mut self.nodes, SlotMap::with_capacity_and_key(len));
        let mut tails: Vec<Option<ChainKey>> = vec![None; bucket_count];

        for head in old_heads {
            let mut cursor = head;
            while let Some(k) = cursor {
                let Some(mut node) = old_nodes.remove(k) else {
                    break;
                };
                cursor = node.next.take();
                let bucket = self.bucket_of(node.hash);
                tails[bucket] = Some(self.link(bucket, tails[bucket], node));
            }
        }
        debug_assert!(old_nodes.is_empty());
        debug_assert_eq!(self.len(), len);
        Ok(())
    }
}

/// Hash map with separate chaining and load-factor driven growth.
///
/// Keys are unique; inserting an existing key replaces its value. There is
/// no removal. `S` defaults to hashbrown's `DefaultHashBuilder`.
///
/// ```
/// use forecast_index::ChainedHashMap;
///
/// let mut m = ChainedHashMap::new();
/// assert!(m.insert("Austin,TX".to_string(), 1));
/// assert!(!m.insert("Austin,TX".to_string(), 2));
/// assert_eq!(m.search("Austin,TX"), Ok(&2));
/// assert_eq!(m.len(), 1);
/// ```
pub struct ChainedHashMap<K, V, S = DefaultHashBuilder> {
    table: ChainTable<K, V>,
    config: HashMapConfig,
    hasher: S,
    last: Cell<Option<ChainKey>>,
    busy: BusyFlag,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Empty map with [`HashMapConfig::default`].
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: HashMapConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V> Default for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(HashMapConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(config: HashMapConfig, hasher: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(config, hasher))
    }

    fn from_parts(config: HashMapConfig, hasher: S) -> Self {
        Self {
            table: ChainTable::with_buckets(config.bucket_count),
            config,
            hasher,
            last: Cell::new(None),
            busy: BusyFlag::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn load_factor(&self) -> f64 {
        self.table.len() as f64 / self.table.bucket_count() as f64
    }

    pub fn config(&self) -> &HashMapConfig {
        &self.config
    }

    /// Inserts or overwrites. Returns `true` if `key` was new.
    ///
    /// A new key that brings `len / bucket_count` to `max_load_factor` or
    /// above grows the table once by `growth_factor`.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let _busy = self.busy.enter("insert");
        let hash = self.make_hash(&key);
        match self.table.upsert(hash, key, value) {
            Slot::Updated(k) => {
                self.last.set(Some(k));
                false
            }
            Slot::Appended(k) => {
                self.last.set(Some(k));
                if self.load_factor() >= self.config.max_load_factor
                    && self.table.grow(&self.config)
                {
                    self.last.set(None);
                }
                true
            }
        }
    }

    pub fn search<Q>(&self, q: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _busy = self.busy.enter("search");
        let k = self.locate(q).ok_or(KeyNotFound)?;
        self.table.nodes.get(k).map(|n| &n.value).ok_or(KeyNotFound)
    }

    pub fn search_mut<Q>(&mut self, q: &Q) -> Result<&mut V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _busy = self.busy.enter("search_mut");
        let k = self.locate(q).ok_or(KeyNotFound)?;
        self.table
            .nodes
            .get_mut(k)
            .map(|n| &mut n.value)
            .ok_or(KeyNotFound)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _busy = self.busy.enter("contains");
        self.locate(q).is_some()
    }

    /// Cache first, then the chain; refreshes the cache either way.
    fn locate<Q>(&self, q: &Q) -> Option<ChainKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some(k) = self.last.get() {
            if self
                .table
                .nodes
                .get(k)
                .is_some_and(|n| n.key.borrow() == q)
            {
                return Some(k);
            }
        }
        let found = self.table.find(self.make_hash(q), |key| key.borrow() == q);
        self.last.set(found);
        found
    }
}

impl<K, V, S> KeyedMap<K, V> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn insert(&mut self, key: K, value: V) -> bool {
        ChainedHashMap::insert(self, key, value)
    }

    fn search(&self, key: &K) -> Result<&V, KeyNotFound> {
        ChainedHashMap::search(self, key)
    }

    fn search_mut(&mut self, key: &K) -> Result<&mut V, KeyNotFound> {
        ChainedHashMap::search_mut(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        ChainedHashMap::contains(self, key)
    }

    fn len(&self) -> usize {
        ChainedHashMap::len(self)
    }
}
