//! Strategy-backed provider over an external cache.

use std::fmt;
use std::time::Duration;

use tracing::warn;

use super::CacheProvider;
use crate::error::{CacheError, Result};

type GetStrategy<K, V> = Box<dyn Fn(&K) -> Option<V> + Send + Sync>;
type SetStrategy<K, V> = Box<dyn Fn(K, V, Option<Duration>) -> Result<()> + Send + Sync>;
type RemoveStrategy<K> = Box<dyn Fn(&K) -> bool + Send + Sync>;

// == Delegating Cache ==
/// Provider that forwards every call to injected strategy closures.
///
/// Expiration is passed through to the set strategy untouched. The external
/// cache is opaque, so enumerating keys is not supported.
pub struct DelegatingCache<K, V> {
    name: String,
    get: GetStrategy<K, V>,
    set: SetStrategy<K, V>,
    remove: RemoveStrategy<K>,
}

impl<K, V> fmt::Debug for DelegatingCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingCache")
            .field("name", &self.name)
            .finish()
    }
}

impl<K, V> DelegatingCache<K, V> {
    /// Builds a provider named `name` (used in errors and logs).
    pub fn new<G, S, R>(name: impl Into<String>, get: G, set: S, remove: R) -> Self
    where
        G: Fn(&K) -> Option<V> + Send + Sync + 'static,
        S: Fn(K, V, Option<Duration>) -> Result<()> + Send + Sync + 'static,
        R: Fn(&K) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            get: Box::new(get),
            set: Box::new(set),
            remove: Box::new(remove),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<K, V> CacheProvider<K, V> for DelegatingCache<K, V> {
    fn contains(&self, key: &K) -> bool {
        (self.get)(key).is_some()
    }

    fn get(&self, key: &K) -> Option<V> {
        (self.get)(key)
    }

    fn set(&self, key: K, value: V, expiration: Option<Duration>) -> Result<()> {
        (self.set)(key, value, expiration)
    }

    fn remove(&self, key: &K) -> bool {
        (self.remove)(key)
    }

    fn keys(&self) -> Result<Vec<K>> {
        warn!("Rejected key enumeration on {}", self.name);
        Err(CacheError::NotSupported(format!(
            "{} cannot enumerate keys",
            self.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    type Store = Arc<Mutex<HashMap<String, (i32, Option<Duration>)>>>;

    fn map_backed(store: Store) -> DelegatingCache<String, i32> {
        let (get_store, set_store, remove_store) = (store.clone(), store.clone(), store);
        DelegatingCache::new(
            "map",
            move |key: &String| get_store.lock().get(key).map(|(v, _)| *v),
            move |key, value, expiration| {
                set_store.lock().insert(key, (value, expiration));
                Ok(())
            },
            move |key: &String| remove_store.lock().remove(key).is_some(),
        )
    }

    #[test]
    fn test_delegate_forwards_calls() {
        let store: Store = Arc::new(Mutex::new(HashMap::new()));
        let cache = map_backed(store.clone());

        cache.set("key1".to_string(), 1, None).unwrap();
        assert!(cache.contains(&"key1".to_string()));
        assert_eq!(cache.get(&"key1".to_string()), Some(1));

        assert!(cache.remove(&"key1".to_string()));
        assert!(!cache.remove(&"key1".to_string()));
        assert!(store.lock().is_empty());
    }

    #[test]
    fn test_delegate_passes_expiration_through() {
        let store: Store = Arc::new(Mutex::new(HashMap::new()));
        let cache = map_backed(store.clone());

        cache
            .set("key1".to_string(), 1, Some(Duration::from_secs(60)))
            .unwrap();

        assert_eq!(
            store.lock().get("key1"),
            Some(&(1, Some(Duration::from_secs(60))))
        );
    }

    #[test]
    fn test_delegate_keys_not_supported() {
        let cache = map_backed(Arc::new(Mutex::new(HashMap::new())));

        let result = cache.keys();
        assert_eq!(
            result,
            Err(CacheError::NotSupported("map cannot enumerate keys".to_string()))
        );
        assert_eq!(cache.name(), "map");
    }

    #[test]
    fn test_delegate_set_error_propagates() {
        let cache: DelegatingCache<String, i32> = DelegatingCache::new(
            "read-only",
            |_: &String| None,
            |_, _, _| Err(CacheError::NotSupported("read-only store".to_string())),
            |_: &String| false,
        );

        let result = cache.set("key1".to_string(), 1, None);
        assert!(matches!(result, Err(CacheError::NotSupported(_))));
    }
}
