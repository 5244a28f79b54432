//! Bounded key-value store with capacity capping
//!
//! When the store is full, inserting a new key is a no-op: nothing is evicted and
//! the caller keeps using the value it just computed. There is no recency
//! bookkeeping, so `get` is a plain hash lookup plus two counter bumps.
//!
//! The store does no locking of its own. Share it across threads through
//! [`SharedQueryOptimizer`](crate::optimizer::SharedQueryOptimizer) or an
//! equivalent external lock.

use crate::cache::types::{CacheStats, InsertOutcome};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::{debug, warn};

/// Size-capped map with access/hit counters
pub struct BoundedCache<K, V> {
    /// Label used in log lines
    name: &'static str,

    entries: HashMap<K, V>,

    max_size: usize,

    accesses: u64,

    hits: u64,

    rejected: u64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Create an empty cache holding at most `max_size` entries
    pub fn new(name: &'static str, max_size: usize) -> Self {
        debug!("Creating bounded cache '{}' (max_size: {})", name, max_size);

        Self {
            name,
            entries: HashMap::new(),
            max_size,
            accesses: 0,
            hits: 0,
            rejected: 0,
        }
    }

    /// Look up a key, counting the access and, on success, the hit
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_ref(key).cloned()
    }

    /// Counted lookup that borrows the stored value instead of cloning it
    pub fn get_ref<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.accesses += 1;

        let value = self.entries.get(key);
        if value.is_some() {
            self.hits += 1;
        }
        value
    }

    /// Look up a key without touching the counters
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Store a value for a new key, subject to capacity
    pub fn put(&mut self, key: K, value: V) -> InsertOutcome {
        if self.entries.contains_key(&key) {
            return InsertOutcome::AlreadyPresent;
        }

        if self.entries.len() >= self.max_size {
            if self.rejected == 0 {
                warn!(
                    "Cache '{}' reached capacity ({} entries); further inserts are dropped",
                    self.name, self.max_size
                );
            }
            self.rejected += 1;
            return InsertOutcome::CapacityReached;
        }

        self.entries.insert(key, value);
        InsertOutcome::Stored
    }

    /// Drop every entry; counters are kept
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        debug!("Cleared {} entries from cache '{}'", count, self.name);
        count
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats::new(
            self.hits,
            self.accesses,
            self.entries.len(),
            self.max_size,
            self.rejected,
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("name", &self.name)
            .field("size", &self.entries.len())
            .field("max_size", &self.max_size)
            .field("accesses", &self.accesses)
            .field("hits", &self.hits)
            .field("rejected", &self.rejected)
            .finish()
    }
}
