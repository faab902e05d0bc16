//! Error types for the cache family
//!
//! Provides unified error handling using thiserror.
//!
//! Missing keys are never errors: lookups return `Option`. Only invalid
//! configuration and capabilities an adapter cannot honour surface here.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache family.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Construction or configuration parameters are invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested capability is not implemented by this cache
    #[error("Not supported: {0}")]
    NotSupported(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache family.
pub type Result<T> = std::result::Result<T, CacheError>;
