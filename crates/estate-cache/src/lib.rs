//! Unbounded, write-once-per-key map shared between request handlers.
//!
//! Every entry lives for the life of the map. There is no eviction and no
//! removal, so callers must only cache values that never change upstream.

use estate_core::{Estate, EstateId};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// One `RwLock` guards the whole map: lookups share the read lock, inserts
/// take the write lock.
pub struct CacheMap<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

pub type EstateCache = CacheMap<EstateId, Estate>;

impl<K, V> CacheMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    /// Inserts or overwrites the value for `key`.
    pub fn set(&self, key: K, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value);
    }
}

impl<K, V> Default for CacheMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for CacheMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .entries
            .read()
            .map(|entries| entries.len())
            .unwrap_or_default();
        f.debug_struct("CacheMap").field("len", &len).finish()
    }
}
