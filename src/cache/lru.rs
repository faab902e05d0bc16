//! Recency Cache Module
//!
//! Implements a capacity-bounded cache with Least Recently Used eviction.
//!
//! Entries live in an arena-backed doubly-linked list ordered from least
//! recently used (head) to most recently used (tail), with a `HashMap` index
//! giving O(1) access into the list. A single mutex guards index and list
//! together, so every public method is one critical section.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{CacheError, Result};

/// Null link in the arena list.
const NIL: usize = usize::MAX;

/// Callback receiving ownership of every value leaving the cache.
pub type Disposer<V> = Box<dyn Fn(V) + Send + Sync>;

// == Recency List ==
#[derive(Debug)]
struct Node<K, V> {
    /// `None` only while the slot sits on the free list
    entry: Option<(K, V)>,
    prev: usize,
    next: usize,
}

/// Unsynchronized LRU bookkeeping. Callers hold the cache lock.
#[derive(Debug)]
struct RecencyList<K, V> {
    index: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    /// Least recently used
    head: usize,
    /// Most recently used
    tail: usize,
    free: Vec<usize>,
}

impl<K: Hash + Eq + Clone, V> RecencyList<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            free: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn lookup(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    fn entry(&self, idx: usize) -> &(K, V) {
        self.nodes[idx]
            .entry
            .as_ref()
            .expect("linked node must hold an entry")
    }

    fn value(&self, idx: usize) -> &V {
        &self.entry(idx).1
    }

    /// Swaps the value stored at `idx`, returning the previous one.
    fn replace(&mut self, idx: usize, value: V) -> V {
        let entry = self.nodes[idx]
            .entry
            .as_mut()
            .expect("linked node must hold an entry");
        std::mem::replace(&mut entry.1, value)
    }

    /// Moves a linked node to the most recently used position.
    fn touch(&mut self, idx: usize) {
        if self.tail != idx {
            self.unlink(idx);
            self.link_tail(idx);
        }
    }

    fn push_tail(&mut self, key: K, value: V) {
        let node = Node {
            entry: Some((key.clone(), value)),
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.link_tail(idx);
        self.index.insert(key, idx);
    }

    fn pop_head(&mut self) -> Option<(K, V)> {
        if self.head == NIL {
            return None;
        }
        let (key, value) = self.release(self.head);
        self.index.remove(&key);
        Some((key, value))
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        let (_, value) = self.release(idx);
        Some(value)
    }

    /// Keys from least to most recently used.
    fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while cursor != NIL {
            keys.push(self.entry(cursor).0.clone());
            cursor = self.nodes[cursor].next;
        }
        keys
    }

    /// Empties the list, yielding values from least to most recently used.
    fn drain(&mut self) -> Vec<V> {
        let mut values = Vec::with_capacity(self.len());
        while let Some((_, value)) = self.pop_head() {
            values.push(value);
        }
        self.nodes.clear();
        self.free.clear();
        values
    }

    fn release(&mut self, idx: usize) -> (K, V) {
        self.unlink(idx);
        self.free.push(idx);
        self.nodes[idx]
            .entry
            .take()
            .expect("linked node must hold an entry")
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn link_tail(&mut self, idx: usize) {
        self.nodes[idx].prev = self.tail;
        self.nodes[idx].next = NIL;
        if self.tail == NIL {
            self.head = idx;
        } else {
            self.nodes[self.tail].next = idx;
        }
        self.tail = idx;
    }
}

// == Recency Cache ==
/// Fixed-capacity cache evicting the least recently used entry.
///
/// Every lookup hit and every insertion moves the entry to the most recently
/// used position, so the eviction order is total.
///
/// An optional disposer receives each value that leaves the cache: evicted,
/// explicitly removed, cleared, or replaced by [`RecencyCache::set`]. It runs
/// synchronously while the cache lock is held and must not call back into the
/// same cache, or it will deadlock.
pub struct RecencyCache<K, V> {
    capacity: usize,
    inner: Mutex<RecencyList<K, V>>,
    disposer: Option<Disposer<V>>,
}

impl<K, V> fmt::Debug for RecencyCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecencyCache")
            .field("capacity", &self.capacity)
            .field("len", &self.inner.lock().index.len())
            .field("has_disposer", &self.disposer.is_some())
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V> RecencyCache<K, V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// Returns `CacheError::InvalidConfig` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            inner: Mutex::new(RecencyList::with_capacity(capacity)),
            disposer: None,
        })
    }

    /// Creates an empty cache that hands every departing value to `disposer`.
    pub fn with_disposer<F>(capacity: usize, disposer: F) -> Result<Self>
    where
        F: Fn(V) + Send + Sync + 'static,
    {
        let mut cache = Self::new(capacity)?;
        cache.disposer = Some(Box::new(disposer));
        Ok(cache)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks for a key without touching its recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().lookup(key).is_some()
    }

    // == Get ==
    /// Returns a clone of the value and marks the entry most recently used.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let mut list = self.inner.lock();
        let idx = list.lookup(key)?;
        list.touch(idx);
        Some(list.value(idx).clone())
    }

    /// Returns a clone of the value without changing recency.
    pub fn peek(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let list = self.inner.lock();
        list.lookup(key).map(|idx| list.value(idx).clone())
    }

    // == Get Or Compute ==
    /// Returns the cached value, or inserts the one produced by `factory`.
    ///
    /// The factory only runs on a miss, under the cache lock, so two calls
    /// for the same key never compute concurrently. Inserting into a full
    /// cache evicts the least recently used entry first.
    pub fn get_or_compute<F>(&self, key: K, factory: F) -> V
    where
        V: Clone,
        F: FnOnce() -> V,
    {
        let mut list = self.inner.lock();
        if let Some(idx) = list.lookup(&key) {
            list.touch(idx);
            return list.value(idx).clone();
        }

        let value = factory();
        self.make_room(&mut list);
        list.push_tail(key, value.clone());
        debug_assert!(list.len() <= self.capacity);
        value
    }

    // == Set ==
    /// Inserts or replaces a value, marking it most recently used.
    ///
    /// A replaced value goes to the disposer. Inserting a new key into a full
    /// cache evicts the least recently used entry first.
    pub fn set(&self, key: K, value: V) {
        let mut list = self.inner.lock();
        if let Some(idx) = list.lookup(&key) {
            let old = list.replace(idx, value);
            list.touch(idx);
            self.dispose(old);
            return;
        }

        self.make_room(&mut list);
        list.push_tail(key, value);
        debug_assert!(list.len() <= self.capacity);
    }

    // == Remove ==
    /// Removes an entry, handing its value to the disposer.
    ///
    /// Returns false if the key was not cached.
    pub fn remove(&self, key: &K) -> bool {
        let mut list = self.inner.lock();
        match list.remove(key) {
            Some(value) => {
                self.dispose(value);
                debug!("Removed entry, {} remaining", list.len());
                true
            }
            None => false,
        }
    }

    /// Removes every entry, disposing values from least to most recently used.
    pub fn clear(&self) {
        let mut list = self.inner.lock();
        let values = list.drain();
        debug!("Cleared {} entries", values.len());
        for value in values {
            self.dispose(value);
        }
    }

    /// Snapshot of the keys, least recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().keys()
    }

    fn make_room(&self, list: &mut RecencyList<K, V>) {
        while list.len() >= self.capacity {
            match list.pop_head() {
                Some((_, evicted)) => {
                    self.dispose(evicted);
                    debug!("Evicted least recently used entry (capacity {})", self.capacity);
                }
                None => break,
            }
        }
    }

    fn dispose(&self, value: V) {
        if let Some(disposer) = &self.disposer {
            disposer(value);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn disposal_log(capacity: usize) -> (RecencyCache<&'static str, i32>, Arc<Mutex<Vec<i32>>>) {
        let log: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let cache =
            RecencyCache::with_disposer(capacity, move |v: i32| sink.lock().push(v)).unwrap();
        (cache, log)
    }

    #[test]
    fn test_lru_new() {
        let cache: RecencyCache<String, i32> = RecencyCache::new(3).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn test_lru_zero_capacity_rejected() {
        let result: Result<RecencyCache<String, i32>> = RecencyCache::new(0);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_lru_get_missing_key() {
        let cache: RecencyCache<&str, i32> = RecencyCache::new(2).unwrap();
        assert_eq!(cache.get(&"missing"), None);
        assert!(!cache.contains(&"missing"));
    }

    #[test]
    fn test_lru_evicts_oldest() {
        let cache = RecencyCache::new(3).unwrap();

        cache.set("key1", 1);
        cache.set("key2", 2);
        cache.set("key3", 3);
        cache.set("key4", 4);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&"key1"), None);
        assert_eq!(cache.keys(), vec!["key2", "key3", "key4"]);
    }

    #[test]
    fn test_lru_get_touches_entry() {
        let cache = RecencyCache::new(2).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        // Order is now [b, a]
        assert_eq!(cache.get(&"a"), Some(1));
        cache.set("c", 3);

        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"c"));
    }

    #[test]
    fn test_lru_peek_does_not_touch() {
        let cache = RecencyCache::new(2).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.peek(&"a"), Some(1));
        cache.set("c", 3);

        assert!(!cache.contains(&"a"));
        assert_eq!(cache.keys(), vec!["b", "c"]);
    }

    #[test]
    fn test_lru_get_or_compute_hit_skips_factory() {
        let cache = RecencyCache::new(2).unwrap();
        cache.set("a", 1);

        let value = cache.get_or_compute("a", || panic!("factory must not run on a hit"));
        assert_eq!(value, 1);
    }

    #[test]
    fn test_lru_get_or_compute_miss_inserts() {
        let cache = RecencyCache::new(2).unwrap();
        let calls = AtomicUsize::new(0);

        let value = cache.get_or_compute("a", || {
            calls.fetch_add(1, Ordering::SeqCst);
            10
        });
        assert_eq!(value, 10);

        let again = cache.get_or_compute("a", || {
            calls.fetch_add(1, Ordering::SeqCst);
            20
        });
        assert_eq!(again, 10);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lru_get_or_compute_evicts_when_full() {
        let (cache, log) = disposal_log(2);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.get(&"a");
        cache.get_or_compute("c", || 3);

        assert_eq!(cache.keys(), vec!["a", "c"]);
        assert_eq!(*log.lock(), vec![2]);
    }

    #[test]
    fn test_lru_set_existing_key_updates_in_place() {
        let (cache, log) = disposal_log(3);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek(&"a"), Some(10));
        // Overwrite moves "a" to the most recently used end
        assert_eq!(cache.keys(), vec!["b", "a"]);
        // Old value handed to the disposer, new one kept
        assert_eq!(*log.lock(), vec![1]);
    }

    #[test]
    fn test_lru_set_existing_key_at_capacity_does_not_evict() {
        let (cache, log) = disposal_log(2);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("b", 20);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&"a"));
        assert_eq!(*log.lock(), vec![2]);
    }

    #[test]
    fn test_lru_disposer_receives_evicted_value_once() {
        let (cache, log) = disposal_log(1);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        assert_eq!(*log.lock(), vec![1, 2]);
        assert_eq!(cache.keys(), vec!["c"]);
    }

    #[test]
    fn test_lru_remove_disposes_value() {
        let (cache, log) = disposal_log(3);

        cache.set("a", 1);
        cache.set("b", 2);

        assert!(cache.remove(&"a"));
        assert!(!cache.remove(&"a"));
        assert_eq!(cache.len(), 1);
        assert_eq!(*log.lock(), vec![1]);
    }

    #[test]
    fn test_lru_clear_disposes_in_recency_order() {
        let (cache, log) = disposal_log(3);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.get(&"a");
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(*log.lock(), vec![2, 3, 1]);

        // Reusable after clear
        cache.set("d", 4);
        assert_eq!(cache.keys(), vec!["d"]);
    }

    #[test]
    fn test_lru_reuses_freed_slots() {
        let cache = RecencyCache::new(2).unwrap();

        for i in 0..100 {
            cache.set(i, i * 2);
        }

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec![98, 99]);
        assert!(cache.inner.lock().nodes.len() <= 2);
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let cache = RecencyCache::new(3).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        cache.get(&"a");
        cache.get(&"c");
        cache.get(&"b");

        assert_eq!(cache.keys(), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_lru_concurrent_access_respects_capacity() {
        let cache = Arc::new(RecencyCache::new(16).unwrap());
        let computed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = cache.clone();
                let computed = computed.clone();
                thread::spawn(move || {
                    for i in 0..500 {
                        let key = (i * 7 + worker) % 32;
                        let value = cache.get_or_compute(key, || {
                            computed.fetch_add(1, Ordering::SeqCst);
                            key * 10
                        });
                        assert_eq!(value, key * 10);
                        assert!(cache.len() <= 16);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 16);
        assert!(computed.load(Ordering::SeqCst) >= 32);
    }
}
