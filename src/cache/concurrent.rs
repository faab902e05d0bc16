//! Concurrent Cache Module
//!
//! Unbounded thread-safe cache with get-or-create semantics.
//!
//! Each key maps to a shared [`Memoized`] cell inside a sharded `DashMap`.
//! The cell is installed with an atomic insert-if-absent and computed outside
//! the shard lock, so concurrent callers for one missing key run a single
//! factory and all observe its result.
//!
//! A key becomes visible to reads (`contains`, `get`, `keys`, ...) once its
//! value has been computed. A cell still computing is reachable only through
//! `get_or_set`, which waits for it.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use super::memo::Memoized;

// == Concurrent Cache ==
/// Capacity-unbounded cache safe to share across threads.
pub struct ConcurrentCache<K, V> {
    cells: DashMap<K, Arc<Memoized<V>>>,
}

impl<K: Hash + Eq, V> fmt::Debug for ConcurrentCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentCache")
            .field("cells", &self.cells.len())
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Default for ConcurrentCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> ConcurrentCache<K, V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.cells
            .get(key)
            .map_or(false, |cell| cell.value().is_ready())
    }

    // == Get ==
    /// Returns the computed value for `key`. Never creates an entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let cell = self.cell(key)?;
        cell.get().cloned()
    }

    // == Get Or Set ==
    /// Returns the value for `key`, computing it with `factory` if absent.
    ///
    /// Callers racing on the same missing key share one factory execution and
    /// receive the same value. A key that already has a cell never recomputes,
    /// whatever factory is passed.
    pub fn get_or_set<F>(&self, key: K, factory: F) -> V
    where
        F: FnOnce() -> V,
    {
        // Shard guard is released at the end of this statement
        let cell = Arc::clone(
            self.cells
                .entry(key)
                .or_insert_with(|| Arc::new(Memoized::pending()))
                .value(),
        );

        cell.get_or_init(|| {
            trace!("Computing value for new cache key");
            factory()
        })
        .clone()
    }

    /// Returns the value for `key`, inserting `value` if absent.
    pub fn get_or_insert(&self, key: K, value: V) -> V {
        self.get_or_set(key, move || value)
    }

    // == Set ==
    /// Inserts or overwrites the value for `key`.
    pub fn set(&self, key: K, value: V) {
        self.cells.insert(key, Arc::new(Memoized::ready(value)));
    }

    // == Try Set ==
    /// Replaces the value for an existing key.
    ///
    /// Best effort: returns false if the key is absent, still computing, or was
    /// replaced by another writer between observation and update. Callers
    /// decide whether to retry.
    pub fn try_set(&self, key: &K, value: V) -> bool {
        let observed = match self.cells.get(key) {
            Some(cell) if cell.value().is_ready() => Arc::clone(cell.value()),
            _ => return false,
        };

        match self.cells.get_mut(key) {
            Some(mut current) if Arc::ptr_eq(current.value(), &observed) => {
                *current = Arc::new(Memoized::ready(value));
                true
            }
            _ => false,
        }
    }

    // == Try Remove ==
    /// Removes `key`, returning its value. `None` if absent or still computing.
    pub fn try_remove(&self, key: &K) -> Option<V> {
        self.cells
            .remove_if(key, |_, cell| cell.is_ready())
            .and_then(|(_, cell)| cell.get().cloned())
    }

    /// Snapshot of keys with computed values, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.cells
            .iter()
            .filter(|entry| entry.value().is_ready())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Snapshot of computed values, in no particular order.
    pub fn values(&self) -> Vec<V> {
        self.cells
            .iter()
            .filter_map(|entry| entry.value().get().cloned())
            .collect()
    }

    /// Number of keys with computed values.
    pub fn count(&self) -> usize {
        self.cells
            .iter()
            .filter(|entry| entry.value().is_ready())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Drops every cell, including ones still computing.
    pub fn remove_all(&self) {
        self.cells.clear();
    }

    fn cell(&self, key: &K) -> Option<Arc<Memoized<V>>> {
        self.cells.get(key).map(|cell| Arc::clone(cell.value()))
    }
}
