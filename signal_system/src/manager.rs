use std::sync::RwLock;

use config::SignalConfig;
use tracing::warn;

use crate::event::CacheEvent;

/// Synchronous callback invoked for every emitted event
pub type EventCallback = Box<dyn Fn(&CacheEvent) + Send + Sync>;

/// Signal manager for cache event notifications
pub struct SignalManager {
    config: SignalConfig,
    callbacks: RwLock<Vec<EventCallback>>,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("config", &self.config)
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl SignalManager {
    pub fn new() -> Self {
        Self::with_config(SignalConfig::default())
    }

    pub fn with_config(config: SignalConfig) -> Self {
        Self {
            config,
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Add event callback
    ///
    /// Returns false when the configured callback limit is reached.
    pub fn add_callback<F>(&self, callback: F) -> bool
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        let Ok(mut callbacks) = self.callbacks.write() else {
            return false;
        };

        if callbacks.len() >= self.config.max_callbacks {
            warn!(
                max_callbacks = self.config.max_callbacks,
                "Callback limit reached, ignoring registration"
            );
            return false;
        }

        callbacks.push(Box::new(callback));
        true
    }

    /// Emit event to all subscribers
    pub fn emit(&self, event: CacheEvent) {
        if !self.config.enabled {
            return;
        }

        if let Ok(callbacks) = self.callbacks.read() {
            for callback in callbacks.iter() {
                callback(&event);
            }
        }
    }

    /// Clear all callbacks
    pub fn clear_callbacks(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }

    /// Get number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new()
    }
}
