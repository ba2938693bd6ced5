//! Key/value backends
//!
//! The adapter talks to its store through [`KeyValueBackend`], a thin async
//! mirror of the Redis commands it needs. Keys passed to a backend are
//! already namespaced; a backend may add its own client-level
//! [`key_prefix`](KeyValueBackend::key_prefix) on top.

pub mod memory;
pub mod redis_impl;

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::CacheError;

pub use memory::MemoryBackend;
pub use redis_impl::RedisBackend;

/// Arguments of a full tag replacement for one entry
#[derive(Debug, Clone, Copy)]
pub struct TagReplacement<'a> {
    /// Namespaced key of the entry being tagged
    pub item_key: &'a str,
    /// Namespaced `<key>:tags` set
    pub tag_set_key: &'a str,
    /// Namespaced prefix of the `tags:<tag>` sets
    pub tag_members_prefix: &'a str,
    /// Logical key recorded in the tag membership sets
    pub member: &'a str,
    /// New tag list, empty to clear
    pub tags: &'a [String],
    /// Abort when `item_key` does not exist
    pub require_existing: bool,
}

#[async_trait]
pub trait KeyValueBackend: Send + Sync + Debug {
    /// Client-level prefix added to every key, reported back by `keys`
    fn key_prefix(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// MGET, one slot per requested key
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError>;

    /// SET, or SETEX when `ttl` is given
    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), CacheError>;

    async fn mset(&self, pairs: &[(String, String)]) -> Result<(), CacheError>;

    /// One SETEX per pair sent as a single pipeline. Returns one success flag per pair.
    async fn set_ex_pipelined(
        &self,
        pairs: &[(String, String)],
        ttl: u64,
    ) -> Result<Vec<bool>, CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// EXISTS for several keys, one flag per key.
    ///
    /// This default issues one command per key.
    async fn exists_many(&self, keys: &[String]) -> Result<Vec<bool>, CacheError> {
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            found.push(self.exists(key).await?);
        }
        Ok(found)
    }

    /// DEL, returns the number of keys removed
    async fn del(&self, keys: &[String]) -> Result<u64, CacheError>;

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, CacheError>;

    /// Remaining lifetime in ms, `-1` without expiry, `-2` when missing
    async fn pttl(&self, key: &str) -> Result<i64, CacheError>;

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, CacheError>;

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64, CacheError>;

    async fn sadd(&self, key: &str, members: &[String]) -> Result<u64, CacheError>;

    async fn srem(&self, key: &str, members: &[String]) -> Result<u64, CacheError>;

    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>, CacheError>;

    /// KEYS, results carry the client-level prefix
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    async fn flushdb(&self) -> Result<(), CacheError>;

    /// INFO for one section as `field -> value`
    async fn info(&self, section: &str) -> Result<HashMap<String, String>, CacheError>;

    async fn ping(&self) -> Result<String, CacheError>;

    /// Replace the tags of one entry, keeping both index sides in step.
    ///
    /// Returns false when `require_existing` is set and the entry is missing.
    /// This default issues one command per step and is not atomic: a
    /// concurrent replacement on the same key may interleave with it.
    /// Backends with a transaction or scripting primitive override it.
    async fn replace_tags(&self, request: TagReplacement<'_>) -> Result<bool, CacheError> {
        if request.require_existing && !self.exists(request.item_key).await? {
            return Ok(false);
        }

        let member = [request.member.to_string()];
        let current = self.smembers(request.tag_set_key).await?;
        for tag in &current {
            let members_key = format!("{}{}", request.tag_members_prefix, tag);
            self.srem(&members_key, &member).await?;
        }
        self.del(&[request.tag_set_key.to_string()]).await?;

        if !request.tags.is_empty() {
            self.sadd(request.tag_set_key, request.tags).await?;
            for tag in request.tags {
                let members_key = format!("{}{}", request.tag_members_prefix, tag);
                self.sadd(&members_key, &member).await?;
            }
        }

        Ok(true)
    }
}

/// Parse an INFO reply into `field -> value`, skipping section headers
pub fn parse_info(raw: &str) -> HashMap<String, String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .collect()
}
