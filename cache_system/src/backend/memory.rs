//! In-process backend
//!
//! Implements the same command set as Redis over a locked hash map: string
//! and set values, millisecond expiry, glob `KEYS`, and an `INFO memory`
//! section. Expired entries are dropped lazily when touched.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{KeyValueBackend, TagReplacement};
use crate::errors::CacheError;
use crate::namespace::escape_glob;

/// Reported as `total_system_memory` unless configured otherwise
const DEFAULT_TOTAL_MEMORY: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
enum Stored {
    Str(String),
    Set(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Stored,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Stored, expires_at: Option<Instant>) -> Self {
        Self { value, expires_at }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn approximate_size(&self) -> u64 {
        let bytes = match &self.value {
            Stored::Str(s) => s.len(),
            Stored::Set(members) => members.iter().map(String::len).sum(),
        };
        bytes as u64
    }
}

type Entries = HashMap<String, Entry>;

/// In-memory key/value store
#[derive(Debug)]
pub struct MemoryBackend {
    key_prefix: String,
    total_memory: u64,
    entries: RwLock<Entries>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            key_prefix: String::new(),
            total_memory: DEFAULT_TOTAL_MEMORY,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Prefix every stored key, like a client-level prefix on Redis
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Value reported as `total_system_memory`
    pub fn with_total_memory(mut self, bytes: u64) -> Self {
        self.total_memory = bytes;
        self
    }

    /// Number of live keys, including tag index entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.read()
            .map(|entries| entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Entries>, CacheError> {
        self.entries
            .read()
            .map_err(|_| CacheError::Unavailable("memory backend lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Entries>, CacheError> {
        self.entries
            .write()
            .map_err(|_| CacheError::Unavailable("memory backend lock poisoned".into()))
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn prefixed_pattern(&self, pattern: &str) -> String {
        format!("{}{}", escape_glob(&self.key_prefix), pattern)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn live<'a>(entries: &'a Entries, key: &str, now: Instant) -> Option<&'a Entry> {
    entries.get(key).filter(|entry| !entry.is_expired(now))
}

fn live_mut<'a>(entries: &'a mut Entries, key: &str, now: Instant) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

/// Deadline `seconds` from `now`, rejected when the clock cannot represent it
fn expiry_after(now: Instant, seconds: u64) -> Result<Instant, CacheError> {
    now.checked_add(Duration::from_secs(seconds))
        .ok_or_else(|| CacheError::InvalidArgument(format!("invalid expire time: {seconds}")))
}

fn wrong_type(key: &str) -> CacheError {
    CacheError::WrongType(format!(
        "{key}: operation against a key holding the wrong kind of value"
    ))
}

fn read_string(entries: &Entries, key: &str, now: Instant) -> Result<Option<String>, CacheError> {
    match live(entries, key, now) {
        Some(Entry {
            value: Stored::Str(s),
            ..
        }) => Ok(Some(s.clone())),
        Some(_) => Err(wrong_type(key)),
        None => Ok(None),
    }
}

fn read_set(entries: &Entries, key: &str, now: Instant) -> Result<BTreeSet<String>, CacheError> {
    match live(entries, key, now) {
        Some(Entry {
            value: Stored::Set(members),
            ..
        }) => Ok(members.clone()),
        Some(_) => Err(wrong_type(key)),
        None => Ok(BTreeSet::new()),
    }
}

fn add_members(
    entries: &mut Entries,
    key: &str,
    members: &[String],
    now: Instant,
) -> Result<u64, CacheError> {
    if members.is_empty() {
        return Ok(0);
    }

    match live_mut(entries, key, now) {
        Some(Entry {
            value: Stored::Set(set),
            ..
        }) => Ok(members.iter().filter(|m| set.insert((*m).clone())).count() as u64),
        Some(_) => Err(wrong_type(key)),
        None => {
            let set: BTreeSet<String> = members.iter().cloned().collect();
            let added = set.len() as u64;
            entries.insert(key.to_string(), Entry::new(Stored::Set(set), None));
            Ok(added)
        }
    }
}

fn remove_members(
    entries: &mut Entries,
    key: &str,
    members: &[String],
    now: Instant,
) -> Result<u64, CacheError> {
    let (removed, now_empty) = match live_mut(entries, key, now) {
        Some(Entry {
            value: Stored::Set(set),
            ..
        }) => {
            let removed = members.iter().filter(|m| set.remove(m.as_str())).count() as u64;
            (removed, set.is_empty())
        }
        Some(_) => return Err(wrong_type(key)),
        None => return Ok(0),
    };

    // Redis drops sets once their last member is gone
    if now_empty {
        entries.remove(key);
    }
    Ok(removed)
}

fn add_to_counter(
    entries: &mut Entries,
    key: &str,
    delta: i64,
    now: Instant,
) -> Result<i64, CacheError> {
    let not_integer =
        || CacheError::WrongType(format!("{key}: value is not an integer or out of range"));

    match live_mut(entries, key, now) {
        Some(Entry {
            value: Stored::Str(s),
            ..
        }) => {
            let current: i64 = s.parse().map_err(|_| not_integer())?;
            let next = current.checked_add(delta).ok_or_else(not_integer)?;
            *s = next.to_string();
            Ok(next)
        }
        Some(_) => Err(wrong_type(key)),
        None => {
            entries.insert(
                key.to_string(),
                Entry::new(Stored::Str(delta.to_string()), None),
            );
            Ok(delta)
        }
    }
}

/// Redis-style glob match supporting `*`, `?` and backslash escapes
pub(crate) fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();
    glob_match_from(&pattern, &candidate)
}

fn glob_match_from(pattern: &[char], candidate: &[char]) -> bool {
    match pattern.split_first() {
        None => candidate.is_empty(),
        Some(('*', rest)) => {
            (0..=candidate.len()).any(|skip| glob_match_from(rest, &candidate[skip..]))
        }
        Some(('?', rest)) => !candidate.is_empty() && glob_match_from(rest, &candidate[1..]),
        Some(('\\', rest)) if !rest.is_empty() => {
            candidate.first() == Some(&rest[0]) && glob_match_from(&rest[1..], &candidate[1..])
        }
        Some((ch, rest)) => {
            candidate.first() == Some(ch) && glob_match_from(rest, &candidate[1..])
        }
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.read()?;
        read_string(&entries, &self.prefixed(key), Instant::now())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        let entries = self.read()?;
        let now = Instant::now();

        // MGET answers nil for keys of another type instead of failing
        Ok(keys
            .iter()
            .map(|key| read_string(&entries, &self.prefixed(key), now).unwrap_or(None))
            .collect())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), CacheError> {
        let expires_at = ttl
            .map(|seconds| expiry_after(Instant::now(), seconds))
            .transpose()?;

        let mut entries = self.write()?;
        entries.insert(
            self.prefixed(key),
            Entry::new(Stored::Str(value.to_string()), expires_at),
        );
        Ok(())
    }

    async fn mset(&self, pairs: &[(String, String)]) -> Result<(), CacheError> {
        let mut entries = self.write()?;
        for (key, value) in pairs {
            entries.insert(
                self.prefixed(key),
                Entry::new(Stored::Str(value.clone()), None),
            );
        }
        Ok(())
    }

    async fn set_ex_pipelined(
        &self,
        pairs: &[(String, String)],
        ttl: u64,
    ) -> Result<Vec<bool>, CacheError> {
        let expires_at = expiry_after(Instant::now(), ttl)?;

        let mut entries = self.write()?;
        Ok(pairs
            .iter()
            .map(|(key, value)| {
                entries.insert(
                    self.prefixed(key),
                    Entry::new(Stored::Str(value.clone()), Some(expires_at)),
                );
                true
            })
            .collect())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let entries = self.read()?;
        Ok(live(&entries, &self.prefixed(key), Instant::now()).is_some())
    }

    async fn exists_many(&self, keys: &[String]) -> Result<Vec<bool>, CacheError> {
        let entries = self.read()?;
        let now = Instant::now();
        Ok(keys
            .iter()
            .map(|key| live(&entries, &self.prefixed(key), now).is_some())
            .collect())
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        let mut entries = self.write()?;
        let now = Instant::now();

        let mut deleted = 0;
        for key in keys {
            if let Some(entry) = entries.remove(&self.prefixed(key)) {
                if !entry.is_expired(now) {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, CacheError> {
        let mut entries = self.write()?;
        let now = Instant::now();
        let key = self.prefixed(key);

        let Some(entry) = live_mut(&mut entries, &key, now) else {
            return Ok(false);
        };

        if seconds == 0 {
            entries.remove(&key);
        } else {
            entry.expires_at = Some(expiry_after(now, seconds)?);
        }
        Ok(true)
    }

    async fn pttl(&self, key: &str) -> Result<i64, CacheError> {
        let entries = self.read()?;
        let now = Instant::now();

        Ok(match live(&entries, &self.prefixed(key), now) {
            None => -2,
            Some(Entry {
                expires_at: None, ..
            }) => -1,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => at.saturating_duration_since(now).as_millis() as i64,
        })
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        let mut entries = self.write()?;
        add_to_counter(&mut entries, &self.prefixed(key), delta, Instant::now())
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        let delta = delta.checked_neg().ok_or_else(|| {
            CacheError::InvalidArgument(format!("decrement out of range: {delta}"))
        })?;
        let mut entries = self.write()?;
        add_to_counter(&mut entries, &self.prefixed(key), delta, Instant::now())
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<u64, CacheError> {
        let mut entries = self.write()?;
        add_members(&mut entries, &self.prefixed(key), members, Instant::now())
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<u64, CacheError> {
        let mut entries = self.write()?;
        remove_members(&mut entries, &self.prefixed(key), members, Instant::now())
    }

    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>, CacheError> {
        let entries = self.read()?;
        read_set(&entries, &self.prefixed(key), Instant::now())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let entries = self.read()?;
        let now = Instant::now();
        let pattern = self.prefixed_pattern(pattern);

        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired(now) && glob_match(&pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn flushdb(&self) -> Result<(), CacheError> {
        self.write()?.clear();
        Ok(())
    }

    async fn info(&self, _section: &str) -> Result<HashMap<String, String>, CacheError> {
        let entries = self.read()?;
        let now = Instant::now();
        let used: u64 = entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .map(Entry::approximate_size)
            .sum();

        Ok(HashMap::from([
            ("used_memory".to_string(), used.to_string()),
            (
                "total_system_memory".to_string(),
                self.total_memory.to_string(),
            ),
        ]))
    }

    async fn ping(&self) -> Result<String, CacheError> {
        Ok("PONG".to_string())
    }

    async fn replace_tags(&self, request: TagReplacement<'_>) -> Result<bool, CacheError> {
        let mut entries = self.write()?;
        let now = Instant::now();
        let item_key = self.prefixed(request.item_key);
        let tag_set_key = self.prefixed(request.tag_set_key);
        let members_prefix = self.prefixed(request.tag_members_prefix);
        let member = [request.member.to_string()];

        if request.require_existing && live(&entries, &item_key, now).is_none() {
            return Ok(false);
        }

        for tag in read_set(&entries, &tag_set_key, now)? {
            remove_members(&mut entries, &format!("{members_prefix}{tag}"), &member, now)?;
        }
        entries.remove(&tag_set_key);

        if !request.tags.is_empty() {
            add_members(&mut entries, &tag_set_key, request.tags, now)?;
            for tag in request.tags {
                add_members(&mut entries, &format!("{members_prefix}{tag}"), &member, now)?;
            }
        }

        Ok(true)
    }
}
