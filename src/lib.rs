//! # TagCache
//!
//! A tagged key/value cache over Redis: namespaced entries with a default
//! TTL, tag-based invalidation, bulk operations and mutation events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tagcache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig {
//!         cache: CacheConfig::new("redis://localhost:6379".to_string())
//!             .with_namespace("shop")
//!             .with_default_ttl(3600),
//!         ..AppConfig::default()
//!     };
//!
//!     let tagcache = TagCache::new(config)?;
//!     let cache = tagcache.cache();
//!
//!     cache.set_item("product:1", "{\"name\":\"lamp\"}").await?;
//!     cache.set_tags("product:1", ["products", "category:lighting"]).await?;
//!
//!     // Invalidate everything in the lighting category
//!     let removed = cache.clear_by_tags(["category:lighting"], true).await?;
//!     println!("Removed {removed} entries");
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::TagCache;
pub use errors::TagCacheError;

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, SignalConfig};

// Re-export internal crates used by the public API
pub use cache_system;
pub use signal_system;

pub use cache_system::{CacheAdapter, CacheError, KeyValueBackend, MemoryBackend, RedisBackend};
pub use signal_system::{CacheEvent, CacheEventKind, SignalManager};

// Re-export external dependencies used in public API
pub use async_trait;
