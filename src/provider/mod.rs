//! Provider Module
//!
//! One capability interface over every cache the crate can talk to.
//!
//! # Adapters
//! - [`RecencyCache`]: no expiration support
//! - [`ConcurrentCache`]: no expiration support
//! - [`DelegatingCache`]: forwards to injected strategies, no enumeration

mod delegate;

use std::hash::Hash;
use std::time::Duration;

use tracing::warn;

use crate::cache::{ConcurrentCache, RecencyCache};
use crate::error::{CacheError, Result};

pub use delegate::DelegatingCache;

// == Cache Provider ==
/// Uniform `Contains/Get/Set/Remove` contract.
///
/// Capabilities an adapter cannot honour fail with
/// [`CacheError::NotSupported`] instead of being ignored.
pub trait CacheProvider<K, V> {
    fn contains(&self, key: &K) -> bool;

    fn get(&self, key: &K) -> Option<V>;

    /// Stores `value`, expiring it after `expiration` when given.
    fn set(&self, key: K, value: V, expiration: Option<Duration>) -> Result<()>;

    /// Returns true if an entry was removed.
    fn remove(&self, key: &K) -> bool;

    /// Snapshot of the stored keys.
    fn keys(&self) -> Result<Vec<K>>;
}

/// Fails fast when a caller asks a cache without expiration to expire.
fn reject_expiration(cache: &str, expiration: Option<Duration>) -> Result<()> {
    match expiration {
        Some(ttl) => {
            warn!("Rejected expiration of {:?} on {}", ttl, cache);
            Err(CacheError::NotSupported(format!(
                "{} does not support expiration",
                cache
            )))
        }
        None => Ok(()),
    }
}

impl<K: Hash + Eq + Clone, V: Clone> CacheProvider<K, V> for RecencyCache<K, V> {
    fn contains(&self, key: &K) -> bool {
        RecencyCache::contains(self, key)
    }

    fn get(&self, key: &K) -> Option<V> {
        RecencyCache::get(self, key)
    }

    fn set(&self, key: K, value: V, expiration: Option<Duration>) -> Result<()> {
        reject_expiration("RecencyCache", expiration)?;
        RecencyCache::set(self, key, value);
        Ok(())
    }

    fn remove(&self, key: &K) -> bool {
        RecencyCache::remove(self, key)
    }

    fn keys(&self) -> Result<Vec<K>> {
        Ok(RecencyCache::keys(self))
    }
}

impl<K: Hash + Eq + Clone, V: Clone> CacheProvider<K, V> for ConcurrentCache<K, V> {
    fn contains(&self, key: &K) -> bool {
        ConcurrentCache::contains(self, key)
    }

    fn get(&self, key: &K) -> Option<V> {
        ConcurrentCache::get(self, key)
    }

    fn set(&self, key: K, value: V, expiration: Option<Duration>) -> Result<()> {
        reject_expiration("ConcurrentCache", expiration)?;
        ConcurrentCache::set(self, key, value);
        Ok(())
    }

    fn remove(&self, key: &K) -> bool {
        self.try_remove(key).is_some()
    }

    fn keys(&self) -> Result<Vec<K>> {
        Ok(ConcurrentCache::keys(self))
    }
}
