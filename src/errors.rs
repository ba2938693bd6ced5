//! Error types for the tagcache crate
//!
//! This module contains the errors returned by [`TagCache`](crate::TagCache)
//! on top of the adapter and configuration errors it forwards.

use cache_system::CacheError;
use config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagCacheError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache adapter not found: {0}")]
    AdapterNotFound(String),

    #[error("Cache adapter already registered: {0}")]
    AdapterAlreadyRegistered(String),

    #[error("Cache backend is unhealthy: {0}")]
    Unhealthy(String),
}
