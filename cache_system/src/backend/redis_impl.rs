//! Redis backend
//!
//! Connects lazily: the client is built from the configuration up front but
//! the multiplexed connection is only opened by the first command and then
//! shared by every clone of the backend.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use config::CacheConfig;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{KeyValueBackend, TagReplacement, parse_info};
use crate::errors::CacheError;
use crate::namespace::escape_glob;

/// Replaces the tag set of one entry and both sides of the index in one step.
///
/// KEYS[1] = entry key
/// KEYS[2] = `<key>:tags` set
/// ARGV[1] = prefix of the `tags:<tag>` sets
/// ARGV[2] = logical key stored in the membership sets
/// ARGV[3] = "1" to require the entry to exist
/// ARGV[4..] = new tags
///
/// Returns 1 on success, 0 when the entry is required but missing.
const REPLACE_TAGS_SCRIPT: &str = r#"
    if ARGV[3] == '1' and redis.call('EXISTS', KEYS[1]) == 0 then
        return 0
    end

    local current = redis.call('SMEMBERS', KEYS[2])
    for _, tag in ipairs(current) do
        redis.call('SREM', ARGV[1] .. tag, ARGV[2])
    end
    redis.call('DEL', KEYS[2])

    if #ARGV > 3 then
        for i = 4, #ARGV do
            redis.call('SADD', KEYS[2], ARGV[i])
            redis.call('SADD', ARGV[1] .. ARGV[i], ARGV[2])
        end
    end

    return 1
"#;

/// Redis-backed key/value store
#[derive(Clone)]
pub struct RedisBackend {
    client: Arc<Client>,
    key_prefix: String,
    connection_timeout: Duration,
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    replace_tags_script: Arc<redis::Script>,
}

impl Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let connection_status = match self.connection.try_read() {
            Ok(conn) if conn.is_some() => "connected",
            Ok(_) => "no_connection",
            Err(_) => "lock_busy",
        };

        f.debug_struct("RedisBackend")
            .field("key_prefix", &self.key_prefix)
            .field("connected", &connection_status)
            .finish()
    }
}

impl RedisBackend {
    /// Create a backend from configuration without connecting
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.as_str())?;
        debug!(url = %mask_redis_url(&config.redis_url), "Redis client created");

        Ok(Self {
            client: Arc::new(client),
            key_prefix: config.key_prefix.clone(),
            connection_timeout: Duration::from_millis(config.connection_timeout_ms),
            connection: Arc::new(RwLock::new(None)),
            replace_tags_script: Arc::new(redis::Script::new(REPLACE_TAGS_SCRIPT)),
        })
    }

    /// Whether the lazy connection has been opened
    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Get or create the shared connection
    async fn get_connection(&self) -> Result<MultiplexedConnection, CacheError> {
        if let Some(conn) = self.connection.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let mut slot = self.connection.write().await;

        // Another caller may have connected while we waited for the write lock
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = tokio::time::timeout(
            self.connection_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| CacheError::Timeout)??;

        info!("Connected to Redis");
        *slot = Some(conn.clone());
        Ok(conn)
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn prefixed_all(&self, keys: &[String]) -> Vec<String> {
        keys.iter().map(|key| self.prefixed(key)).collect()
    }

    /// KEYS pattern under the client prefix, which is matched literally
    fn prefixed_pattern(&self, pattern: &str) -> String {
        format!("{}{}", escape_glob(&self.key_prefix), pattern)
    }
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.prefixed(key)).await?;
        Ok(value)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_connection().await?;
        // Explicit MGET so a single key still yields a list reply
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(self.prefixed_all(keys))
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), CacheError> {
        let mut conn = self.get_connection().await?;
        let key = self.prefixed(key);

        match ttl {
            Some(seconds) => {
                let _: () = conn.set_ex(&key, value, seconds).await?;
            }
            None => {
                let _: () = conn.set(&key, value).await?;
            }
        }
        Ok(())
    }

    async fn mset(&self, pairs: &[(String, String)]) -> Result<(), CacheError> {
        if pairs.is_empty() {
            return Ok(());
        }

        let items: Vec<(String, &str)> = pairs
            .iter()
            .map(|(key, value)| (self.prefixed(key), value.as_str()))
            .collect();

        let mut conn = self.get_connection().await?;
        let _: () = conn.mset(&items).await?;
        Ok(())
    }

    async fn set_ex_pipelined(
        &self,
        pairs: &[(String, String)],
        ttl: u64,
    ) -> Result<Vec<bool>, CacheError> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for (key, value) in pairs {
            pipe.set_ex(self.prefixed(key), value, ttl);
        }

        let mut conn = self.get_connection().await?;
        let replies: Vec<redis::Value> = pipe.query_async(&mut conn).await?;

        Ok(replies
            .iter()
            .map(|reply| matches!(reply, redis::Value::Okay))
            .collect())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.get_connection().await?;
        let exists: bool = conn.exists(self.prefixed(key)).await?;
        Ok(exists)
    }

    async fn exists_many(&self, keys: &[String]) -> Result<Vec<bool>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for key in keys {
            pipe.exists(self.prefixed(key));
        }

        let mut conn = self.get_connection().await?;
        let found: Vec<bool> = pipe.query_async(&mut conn).await?;
        Ok(found)
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_connection().await?;
        let deleted: u64 = conn.del(self.prefixed_all(keys)).await?;
        Ok(deleted)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, CacheError> {
        let seconds = i64::try_from(seconds)
            .map_err(|_| CacheError::InvalidArgument(format!("TTL out of range: {seconds}")))?;

        let mut conn = self.get_connection().await?;
        let applied: bool = conn.expire(self.prefixed(key), seconds).await?;
        Ok(applied)
    }

    async fn pttl(&self, key: &str) -> Result<i64, CacheError> {
        let mut conn = self.get_connection().await?;
        let remaining: i64 = conn.pttl(self.prefixed(key)).await?;
        Ok(remaining)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        let mut conn = self.get_connection().await?;
        let value: i64 = conn.incr(self.prefixed(key), delta).await?;
        Ok(value)
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        let mut conn = self.get_connection().await?;
        let value: i64 = conn.decr(self.prefixed(key), delta).await?;
        Ok(value)
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<u64, CacheError> {
        if members.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_connection().await?;
        let added: u64 = conn.sadd(self.prefixed(key), members).await?;
        Ok(added)
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<u64, CacheError> {
        if members.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_connection().await?;
        let removed: u64 = conn.srem(self.prefixed(key), members).await?;
        Ok(removed)
    }

    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>, CacheError> {
        let mut conn = self.get_connection().await?;
        let members: BTreeSet<String> = conn.smembers(self.prefixed(key)).await?;
        Ok(members)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.get_connection().await?;
        let keys: Vec<String> = conn.keys(self.prefixed_pattern(pattern)).await?;
        Ok(keys)
    }

    async fn flushdb(&self) -> Result<(), CacheError> {
        let mut conn = self.get_connection().await?;
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    async fn info(&self, section: &str) -> Result<HashMap<String, String>, CacheError> {
        let mut conn = self.get_connection().await?;
        let raw: String = redis::cmd("INFO").arg(section).query_async(&mut conn).await?;
        Ok(parse_info(&raw))
    }

    async fn ping(&self) -> Result<String, CacheError> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong)
    }

    async fn replace_tags(&self, request: TagReplacement<'_>) -> Result<bool, CacheError> {
        let mut conn = self.get_connection().await?;

        let applied: i64 = self
            .replace_tags_script
            .key(self.prefixed(request.item_key))
            .key(self.prefixed(request.tag_set_key))
            .arg(self.prefixed(request.tag_members_prefix))
            .arg(request.member)
            .arg(if request.require_existing { "1" } else { "0" })
            .arg(request.tags)
            .invoke_async(&mut conn)
            .await?;

        match applied {
            1 => Ok(true),
            0 => Ok(false),
            other => Err(CacheError::UnexpectedResponse(format!(
                "tag replacement script returned {other}"
            ))),
        }
    }
}

/// Mask password in Redis URL for safe logging.
fn mask_redis_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if colon_pos >= scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
