//! Cache Module
//!
//! Provides the two in-process caches:
//! - [`RecencyCache`]: fixed capacity, LRU eviction, optional disposal hook
//! - [`ConcurrentCache`]: unbounded, single factory execution per key

mod concurrent;
mod lru;
mod memo;


// Re-export public types
pub use concurrent::ConcurrentCache;
pub use lru::{Disposer, RecencyCache};
