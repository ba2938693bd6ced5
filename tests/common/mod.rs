//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tagcache::prelude::*;

/// Adapter over a fresh in-memory backend
pub fn memory_adapter(namespace: &str, ttl: u64) -> CacheAdapter {
    adapter_over(Arc::new(MemoryBackend::new()), namespace, ttl)
}

/// Adapter over an existing backend, used to reconfigure the TTL or namespace
/// while keeping the stored data
pub fn adapter_over(backend: Arc<dyn KeyValueBackend>, namespace: &str, ttl: u64) -> CacheAdapter {
    let config = CacheConfig::default()
        .with_namespace(namespace)
        .with_default_ttl(ttl);
    CacheAdapter::with_backend(config, backend).unwrap()
}

pub fn tags(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Backend whose every command fails as if the server went away
#[derive(Debug, Default)]
pub struct FailingBackend;

fn refused<T>() -> Result<T, CacheError> {
    Err(CacheError::Connection("connection refused".into()))
}

#[async_trait]
impl KeyValueBackend for FailingBackend {
    fn key_prefix(&self) -> &str {
        ""
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        refused()
    }

    async fn mget(&self, _keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        refused()
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<u64>) -> Result<(), CacheError> {
        refused()
    }

    async fn mset(&self, _pairs: &[(String, String)]) -> Result<(), CacheError> {
        refused()
    }

    async fn set_ex_pipelined(
        &self,
        _pairs: &[(String, String)],
        _ttl: u64,
    ) -> Result<Vec<bool>, CacheError> {
        refused()
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        refused()
    }

    async fn del(&self, _keys: &[String]) -> Result<u64, CacheError> {
        refused()
    }

    async fn expire(&self, _key: &str, _seconds: u64) -> Result<bool, CacheError> {
        refused()
    }

    async fn pttl(&self, _key: &str) -> Result<i64, CacheError> {
        refused()
    }

    async fn incr_by(&self, _key: &str, _delta: i64) -> Result<i64, CacheError> {
        refused()
    }

    async fn decr_by(&self, _key: &str, _delta: i64) -> Result<i64, CacheError> {
        refused()
    }

    async fn sadd(&self, _key: &str, _members: &[String]) -> Result<u64, CacheError> {
        refused()
    }

    async fn srem(&self, _key: &str, _members: &[String]) -> Result<u64, CacheError> {
        refused()
    }

    async fn smembers(&self, _key: &str) -> Result<BTreeSet<String>, CacheError> {
        refused()
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
        refused()
    }

    async fn flushdb(&self) -> Result<(), CacheError> {
        refused()
    }

    async fn info(&self, _section: &str) -> Result<HashMap<String, String>, CacheError> {
        refused()
    }

    async fn ping(&self) -> Result<String, CacheError> {
        refused()
    }
}

/// In-memory backend that leaves tag replacement to the trait's step-wise
/// default instead of its single-lock override
#[derive(Debug, Default)]
pub struct StepwiseBackend {
    inner: MemoryBackend,
}

#[async_trait]
impl KeyValueBackend for StepwiseBackend {
    fn key_prefix(&self) -> &str {
        self.inner.key_prefix()
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        self.inner.mget(keys).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), CacheError> {
        self.inner.set(key, value, ttl).await
    }

    async fn mset(&self, pairs: &[(String, String)]) -> Result<(), CacheError> {
        self.inner.mset(pairs).await
    }

    async fn set_ex_pipelined(
        &self,
        pairs: &[(String, String)],
        ttl: u64,
    ) -> Result<Vec<bool>, CacheError> {
        self.inner.set_ex_pipelined(pairs, ttl).await
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.exists(key).await
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        self.inner.del(keys).await
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, CacheError> {
        self.inner.expire(key, seconds).await
    }

    async fn pttl(&self, key: &str) -> Result<i64, CacheError> {
        self.inner.pttl(key).await
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        self.inner.incr_by(key, delta).await
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        self.inner.decr_by(key, delta).await
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<u64, CacheError> {
        self.inner.sadd(key, members).await
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<u64, CacheError> {
        self.inner.srem(key, members).await
    }

    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>, CacheError> {
        self.inner.smembers(key).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        self.inner.keys(pattern).await
    }

    async fn flushdb(&self) -> Result<(), CacheError> {
        self.inner.flushdb().await
    }

    async fn info(&self, section: &str) -> Result<HashMap<String, String>, CacheError> {
        self.inner.info(section).await
    }

    async fn ping(&self) -> Result<String, CacheError> {
        self.inner.ping().await
    }
}
