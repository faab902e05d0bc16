//! Configuration Module
//!
//! Handles loading and validating workload driver configuration from
//! environment variables.

use std::env;

use crate::error::{CacheError, Result};

/// Workload driver configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the bounded recency cache
    pub cache_capacity: usize,
    /// Number of concurrent workers
    pub worker_count: usize,
    /// Operations each worker performs against each cache
    pub operations_per_worker: usize,
    /// Number of distinct keys the workers draw from
    pub key_space: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Bounded cache capacity (default: 1000)
    /// - `WORKER_COUNT` - Concurrent workers (default: 4)
    /// - `OPERATIONS_PER_WORKER` - Operations per worker (default: 10000)
    /// - `KEY_SPACE` - Distinct keys (default: 2000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_capacity: env_or("CACHE_CAPACITY", defaults.cache_capacity),
            worker_count: env_or("WORKER_COUNT", defaults.worker_count),
            operations_per_worker: env_or(
                "OPERATIONS_PER_WORKER",
                defaults.operations_per_worker,
            ),
            key_space: env_or("KEY_SPACE", defaults.key_space),
        }
    }

    /// Rejects zero-valued parameters. Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("cache_capacity", self.cache_capacity),
            ("worker_count", self.worker_count),
            ("operations_per_worker", self.operations_per_worker),
            ("key_space", self.key_space),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(CacheError::InvalidConfig(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn env_or(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            worker_count: 4,
            operations_per_worker: 10_000,
            key_space: 2000,
        }
    }
}
