//! Signal system for cache event handling
//!
//! This crate provides callback-based notification of cache mutations
//! (writes, removals, tag changes and bulk invalidations).

pub mod event;
pub mod manager;
pub mod prelude;

pub use config::SignalConfig;
pub use event::{CacheEvent, CacheEventKind};
pub use manager::{EventCallback, SignalManager};
