//! Keyed Cache - in-process key/value caches
//!
//! Provides a bounded LRU cache with disposal hooks, an unbounded concurrent
//! cache that computes each key at most once, and a uniform provider
//! interface over both.

pub mod cache;
pub mod config;
pub mod error;
pub mod provider;
pub mod tasks;

pub use cache::{ConcurrentCache, RecencyCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use provider::{CacheProvider, DelegatingCache};
pub use tasks::spawn_workload;
