//! Convenience re-exports for common tagcache usage
//!
//! # Example
//!
//! ```rust
//! use tagcache::prelude::*;
//!
//! // TagCache, CacheAdapter, the backends and event types are now in scope
//! ```

// Core components
pub use crate::core::TagCache;
pub use crate::errors::TagCacheError;

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, ConfigError, SignalConfig};

// Re-export signal system for event handling
pub use signal_system::prelude::*;

// Re-export cache system
pub use cache_system::prelude::*;

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use tokio;
