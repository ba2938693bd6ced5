//! Convenience re-exports for common signal-system usage

// Core signal system components
pub use crate::event::{CacheEvent, CacheEventKind};
pub use crate::manager::{EventCallback, SignalManager};

// Re-export centralized config
pub use config::SignalConfig;

// Common external dependencies
pub use serde::{Deserialize, Serialize};
pub use serde_json;
