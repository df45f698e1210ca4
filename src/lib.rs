//! forecast-index: two insert-only associative containers and a small
//! forecast lookup tool built on them.
//!
//! Containers
//! - [`ChainedHashMap`]: bucket array of singly linked chains with
//!   load-factor driven growth by a configurable factor.
//! - [`RedBlackTreeMap`]: ordered map rebalanced on insert by color flips
//!   and rotations.
//!
//! Both implement [`KeyedMap`] (`insert`, `search`, `search_mut`,
//! `contains`, `len`) and fail lookups of absent keys with [`KeyNotFound`].
//!
//! Storage
//! - Nodes live in a `slotmap` arena per container. Chain links, child
//!   links and tree parent links are arena keys, not pointers; the arena is
//!   the single owner and dropping the container frees every node.
//! - Arena keys are generational: a stale key fails to resolve instead of
//!   aliasing a newer node.
//!
//! Lookup cache
//! - Each container remembers the node of its last successful lookup or
//!   insert and checks it before hashing or descending.
//! - A miss clears it; hash-map growth clears it because every node moves
//!   to a new arena.
//!
//! Threading
//! - No internal synchronization. The containers are `Send` but `!Sync`;
//!   sharing one between threads needs an external lock.
//!
//! Reentrancy
//! - `K: Eq`/`K: Hash`/`K: Ord` run while links are being walked or
//!   rewired. In debug builds a key that calls back into the same container
//!   from those impls panics instead of seeing an inconsistent structure.
//!
//! Front end
//! - [`reader`] parses forecast rows and groups them by `"city,state"`.
//! - [`table`] renders them as fixed-width columns.
//! - [`repl`] answers location queries until the `EXIT` sentinel.

pub mod chained_hash_map;
mod chained_hash_map_proptest;
pub mod config;
pub mod error;
mod guard;
pub mod keyed_map;
pub mod logger;
pub mod reader;
pub mod record;
pub mod red_black_tree_map;
mod red_black_tree_map_proptest;
pub mod repl;
pub mod table;

// Public surface
pub use chained_hash_map::ChainedHashMap;
pub use config::HashMapConfig;
pub use error::{ConfigError, KeyNotFound, LoadError, RecordError};
pub use keyed_map::KeyedMap;
pub use record::WeatherRecord;
pub use red_black_tree_map::RedBlackTreeMap;
