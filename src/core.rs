//! Core TagCache functionality
//!
//! This module contains the [`TagCache`] coordinator: it owns the shared
//! backend connection and signal manager, builds adapters for additional
//! namespaces over that connection and keeps a registry of named adapters.

use std::collections::HashMap;
use std::sync::Arc;

use cache_system::{CacheAdapter, KeyValueBackend, RedisBackend};
use config::{AppConfig, CacheConfig};
use signal_system::SignalManager;

use crate::errors::TagCacheError;
use crate::{debug_log, trace_log};

/// Main coordinator owning the backend, the signal manager and named adapters
pub struct TagCache {
    config: AppConfig,
    backend: Arc<dyn KeyValueBackend>,
    signals: Option<Arc<SignalManager>>,
    default_adapter: CacheAdapter,
    adapters: HashMap<String, CacheAdapter>,
}

impl std::fmt::Debug for TagCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagCache")
            .field("config", &self.config)
            .field("backend", &self.backend)
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TagCache {
    /// Create a TagCache talking to the Redis server from `config`.
    ///
    /// No connection is opened until the first command.
    pub fn new(config: AppConfig) -> Result<Self, TagCacheError> {
        config.validate()?;
        let backend = RedisBackend::new(&config.cache)?;
        Self::with_backend(config, Arc::new(backend))
    }

    /// Create a TagCache from the environment and `tagcache.toml`
    pub fn from_env() -> Result<Self, TagCacheError> {
        Self::new(AppConfig::load()?)
    }

    /// Create a TagCache over any backend
    pub fn with_backend(
        config: AppConfig,
        backend: Arc<dyn KeyValueBackend>,
    ) -> Result<Self, TagCacheError> {
        config.validate()?;

        let signals = config
            .signal
            .enabled
            .then(|| Arc::new(SignalManager::with_config(config.signal.clone())));

        let mut default_adapter = CacheAdapter::with_backend(config.cache.clone(), backend.clone())?;
        if let Some(signals) = &signals {
            default_adapter = default_adapter.with_signals(signals.clone());
        }

        debug_log!(
            namespace = %config.cache.namespace,
            ttl = config.cache.default_ttl,
            signals = signals.is_some(),
            "TagCache initialized"
        );

        Ok(Self {
            config,
            backend,
            signals,
            default_adapter,
            adapters: HashMap::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Adapter for the configured namespace
    pub fn cache(&self) -> &CacheAdapter {
        &self.default_adapter
    }

    /// Signal manager, `None` when events are disabled
    pub fn signals(&self) -> Option<&Arc<SignalManager>> {
        self.signals.as_ref()
    }

    /// Build an adapter for another namespace sharing this connection.
    ///
    /// `default_ttl` falls back to the configured one when `None`.
    pub fn namespaced(
        &self,
        namespace: &str,
        default_ttl: Option<u64>,
    ) -> Result<CacheAdapter, TagCacheError> {
        let config = CacheConfig {
            namespace: namespace.to_string(),
            default_ttl: default_ttl.unwrap_or(self.config.cache.default_ttl),
            ..self.config.cache.clone()
        };

        let mut adapter = CacheAdapter::with_backend(config, self.backend.clone())?;
        if let Some(signals) = &self.signals {
            adapter = adapter.with_signals(signals.clone());
        }
        Ok(adapter)
    }

    /// Register an adapter under a given name
    pub fn register_adapter(
        &mut self,
        name: String,
        adapter: CacheAdapter,
    ) -> Result<(), TagCacheError> {
        if self.adapters.contains_key(&name) {
            return Err(TagCacheError::AdapterAlreadyRegistered(name));
        }

        trace_log!(name = %name, "Registering cache adapter");
        self.adapters.insert(name, adapter);
        Ok(())
    }

    /// Get a registered adapter by name
    pub fn adapter(&self, name: &str) -> Result<&CacheAdapter, TagCacheError> {
        self.adapters
            .get(name)
            .ok_or_else(|| TagCacheError::AdapterNotFound(name.to_string()))
    }

    /// List all registered adapter names
    pub fn list_adapters(&self) -> Vec<&String> {
        self.adapters.keys().collect()
    }

    /// Remove an adapter by name
    pub fn unregister_adapter(&mut self, name: &str) -> Result<(), TagCacheError> {
        self.adapters
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| TagCacheError::AdapterNotFound(name.to_string()))
    }

    /// Check that the backend answers PING
    pub async fn health_check(&self) -> Result<(), TagCacheError> {
        if self.default_adapter.ping().await? {
            Ok(())
        } else {
            Err(TagCacheError::Unhealthy("unexpected PING reply".into()))
        }
    }
}
