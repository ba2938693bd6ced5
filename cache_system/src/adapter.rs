//! Cache adapter
//!
//! This module provides [`CacheAdapter`], which maps the cache contract onto a
//! [`KeyValueBackend`]. Tag operations live in `tags.rs`, multi-key
//! operations in `bulk.rs`.

use std::fmt::Debug;
use std::sync::Arc;

use config::CacheConfig;
use serde::{Serialize, de::DeserializeOwned};
use signal_system::{CacheEvent, CacheEventKind, SignalManager};
use tracing::debug;

use crate::backend::{KeyValueBackend, RedisBackend};
use crate::errors::CacheError;
use crate::namespace::KeyNamespacer;
use crate::ttl::{Metadata, TtlPolicy};
use crate::value::CacheValue;

/// Tagged key/value cache over a Redis-compatible backend
///
/// Cloning is cheap and clones share the backend connection.
#[derive(Clone)]
pub struct CacheAdapter {
    pub(crate) backend: Arc<dyn KeyValueBackend>,
    pub(crate) config: Arc<CacheConfig>,
    pub(crate) namespacer: KeyNamespacer,
    pub(crate) ttl: TtlPolicy,
    pub(crate) signals: Option<Arc<SignalManager>>,
}

impl Debug for CacheAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAdapter")
            .field("config", &self.config)
            .field("backend", &self.backend)
            .field("has_signals", &self.signals.is_some())
            .finish()
    }
}

impl CacheAdapter {
    /// Create an adapter talking to Redis. The connection opens on first use.
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        let backend = RedisBackend::new(&config)?;
        Self::with_backend(config, Arc::new(backend))
    }

    /// Create an adapter over any backend
    pub fn with_backend(
        config: CacheConfig,
        backend: Arc<dyn KeyValueBackend>,
    ) -> Result<Self, CacheError> {
        config.validate()?;

        Ok(Self {
            namespacer: KeyNamespacer::new(&config.namespace, &config.namespace_separator),
            ttl: TtlPolicy::new(config.default_ttl),
            config: Arc::new(config),
            backend,
            signals: None,
        })
    }

    /// Publish mutation events through `signals`
    pub fn with_signals(mut self, signals: Arc<SignalManager>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    pub fn namespacer(&self) -> &KeyNamespacer {
        &self.namespacer
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        self.ttl
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.backend.get(&self.namespacer.physical_key(key)).await
    }

    pub async fn has_item(&self, key: &str) -> Result<bool, CacheError> {
        self.backend.exists(&self.namespacer.physical_key(key)).await
    }

    /// Store a value, applying the configured TTL
    pub async fn set_item(
        &self,
        key: &str,
        value: impl Into<CacheValue>,
    ) -> Result<bool, CacheError> {
        let value = value.into();
        self.backend
            .set(
                &self.namespacer.physical_key(key),
                value.as_str(),
                self.ttl.expiry(),
            )
            .await?;

        debug!(key, ttl = self.ttl.seconds(), "Cache item stored");
        self.emit(|| CacheEvent::new(CacheEventKind::Set).with_key(key));
        Ok(true)
    }

    /// Remove one entry along with its tag memberships
    pub async fn remove_item(&self, key: &str) -> Result<bool, CacheError> {
        self.unlink_tags(key).await?;

        let deleted = self
            .backend
            .del(&[self.namespacer.physical_key(key)])
            .await?;

        if deleted > 0 {
            self.emit(|| CacheEvent::new(CacheEventKind::Remove).with_key(key));
        }
        Ok(deleted > 0)
    }

    /// INCRBY, returns the new value
    pub async fn increment_item(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        self.backend
            .incr_by(&self.namespacer.physical_key(key), delta)
            .await
    }

    /// DECRBY, returns the new value
    pub async fn decrement_item(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        self.backend
            .decr_by(&self.namespacer.physical_key(key), delta)
            .await
    }

    /// Re-apply the configured TTL. Returns false when the key does not exist.
    ///
    /// With expiry disabled the entry is left as is; `EXPIRE key 0` would delete it.
    pub async fn touch_item(&self, key: &str) -> Result<bool, CacheError> {
        let physical = self.namespacer.physical_key(key);

        let touched = match self.ttl.expiry() {
            Some(seconds) => self.backend.expire(&physical, seconds).await?,
            None => self.backend.exists(&physical).await?,
        };

        if touched {
            self.emit(|| CacheEvent::new(CacheEventKind::Touch).with_key(key));
        }
        Ok(touched)
    }

    /// Remaining lifetime, `None` when the key does not exist
    pub async fn get_metadata(&self, key: &str) -> Result<Option<Metadata>, CacheError> {
        let pttl = self
            .backend
            .pttl(&self.namespacer.physical_key(key))
            .await?;
        Ok(Metadata::from_pttl(pttl))
    }

    /// Store a value serialized as JSON
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<bool, CacheError> {
        let json = serde_json::to_string(value)?;
        self.set_item(key, json).await
    }

    /// Read a value stored with [`set_json`](Self::set_json)
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_item(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Remove every key of the backend database, not only this namespace
    pub async fn flush(&self) -> Result<bool, CacheError> {
        self.backend.flushdb().await?;
        self.emit(|| CacheEvent::new(CacheEventKind::Flush));
        Ok(true)
    }

    /// Total memory of the backend host in bytes
    pub async fn get_total_space(&self) -> Result<u64, CacheError> {
        let info = self.backend.info("memory").await?;
        let raw = info.get("total_system_memory").ok_or_else(|| {
            CacheError::UnexpectedResponse("INFO memory lacks total_system_memory".into())
        })?;

        raw.trim().parse().map_err(|_| {
            CacheError::UnexpectedResponse(format!("invalid total_system_memory: {raw}"))
        })
    }

    /// Check that the backend answers
    pub async fn ping(&self) -> Result<bool, CacheError> {
        let pong = self.backend.ping().await?;
        Ok(pong.eq_ignore_ascii_case("PONG"))
    }

    pub(crate) fn emit(&self, event: impl FnOnce() -> CacheEvent) {
        if let Some(signals) = &self.signals {
            signals.emit(event());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn adapter(ttl: u64) -> CacheAdapter {
        let config = CacheConfig::default().with_default_ttl(ttl);
        CacheAdapter::with_backend(config, Arc::new(MemoryBackend::new())).unwrap()
    }

    #[tokio::test]
    async fn test_set_uses_namespace() {
        let cache = adapter(0);
        cache.set_item("key", "val").await.unwrap();

        let raw = cache.backend().get("tagcache:key").await.unwrap();
        assert_eq!(raw.as_deref(), Some("val"));
    }

    #[tokio::test]
    async fn test_set_applies_ttl() {
        let cache = adapter(60);
        cache.set_item("key", 1).await.unwrap();

        let metadata = cache.get_metadata("key").await.unwrap().unwrap();
        let ttl = metadata.ttl.unwrap();
        assert!(ttl > 59.0 && ttl <= 60.0);
    }

    #[tokio::test]
    async fn test_touch_without_ttl_keeps_entry() {
        let cache = adapter(0);
        cache.set_item("key", "val").await.unwrap();

        assert!(cache.touch_item("key").await.unwrap());
        assert!(cache.has_item("key").await.unwrap());
        assert!(!cache.touch_item("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let cache = adapter(0);
        cache.set_json("list", &vec!["test", "of", "array"]).await.unwrap();

        let list: Vec<String> = cache.get_json("list").await.unwrap().unwrap();
        assert_eq!(list, vec!["test", "of", "array"]);
        assert!(cache.get_json::<Vec<String>>("none").await.unwrap().is_none());

        cache.set_item("broken", "{").await.unwrap();
        assert!(matches!(
            cache.get_json::<Vec<String>>("broken").await,
            Err(CacheError::SerializationError(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CacheConfig::default().with_namespace_separator("");
        assert!(matches!(
            CacheAdapter::with_backend(config, Arc::new(MemoryBackend::new())),
            Err(CacheError::Config(_))
        ));
    }
}
