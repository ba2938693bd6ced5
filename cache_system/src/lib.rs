//! Cache system for Redis-based tagged caching
//!
//! This crate provides [`CacheAdapter`], a key/value cache with tag-based
//! invalidation and namespace clearing on top of a Redis-compatible
//! backend, plus an in-memory backend implementing the same commands.

pub mod adapter;
pub mod backend;
mod bulk;
pub mod errors;
pub mod namespace;
pub mod prelude;
mod tags;
pub mod ttl;
pub mod value;

// Re-export centralized config
pub use config::CacheConfig;

pub use adapter::CacheAdapter;
pub use backend::{KeyValueBackend, MemoryBackend, RedisBackend, TagReplacement};
pub use errors::CacheError;
pub use namespace::KeyNamespacer;
pub use ttl::{Metadata, TtlPolicy};
pub use value::CacheValue;
