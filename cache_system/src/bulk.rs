//! Multi-key operations and namespace clearing

use std::collections::{BTreeSet, HashMap};

use signal_system::{CacheEvent, CacheEventKind};
use tracing::{debug, warn};

use crate::adapter::CacheAdapter;
use crate::errors::CacheError;
use crate::namespace::{KeyNamespacer, KeyRole, prefix_pattern};
use crate::value::CacheValue;

impl CacheAdapter {
    /// Fetch several entries in one round trip. Missing keys are left out.
    pub async fn get_items<K: AsRef<str>>(
        &self,
        keys: &[K],
    ) -> Result<HashMap<String, String>, CacheError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let physical = self.physical_keys(keys);
        let values = self.backend.mget(&physical).await?;

        Ok(keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|v| (key.as_ref().to_string(), v)))
            .collect())
    }

    /// The subset of `keys` that exist, checked in one round trip
    pub async fn has_items<K: AsRef<str>>(&self, keys: &[K]) -> Result<Vec<String>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let present = self.backend.exists_many(&self.physical_keys(keys)).await?;
        Ok(present_keys(keys, &present))
    }

    /// Store several entries and return the keys that failed to write.
    ///
    /// With a TTL configured every pair becomes a SETEX in one pipeline,
    /// otherwise a single MSET is issued.
    pub async fn set_items<I, K, V>(&self, items: I) -> Result<Vec<String>, CacheError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CacheValue>,
    {
        let (keys, pairs): (Vec<String>, Vec<(String, String)>) = items
            .into_iter()
            .map(|(key, value)| {
                let key: String = key.into();
                let value: CacheValue = value.into();
                let physical = self.namespacer.physical_key(&key);
                (key, (physical, value.into_string()))
            })
            .unzip();

        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let failed: Vec<String> = match self.ttl.expiry() {
            Some(seconds) => {
                let written = self.backend.set_ex_pipelined(&pairs, seconds).await?;
                keys.iter()
                    .zip(written.iter().copied().chain(std::iter::repeat(false)))
                    .filter(|(_, ok)| !ok)
                    .map(|(key, _)| key.clone())
                    .collect()
            }
            None => {
                self.backend.mset(&pairs).await?;
                Vec::new()
            }
        };

        if !failed.is_empty() {
            warn!(failed = failed.len(), total = keys.len(), "Some cache writes failed");
        }

        self.emit(|| {
            CacheEvent::new(CacheEventKind::Set)
                .with_keys(keys.iter().filter(|key| !failed.contains(*key)).cloned())
        });
        Ok(failed)
    }

    /// Remove several entries with their tag memberships.
    ///
    /// Returns how many entries the backend actually deleted.
    pub async fn remove_items<K: AsRef<str>>(&self, keys: &[K]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let physical = self.physical_keys(keys);
        let present = self.backend.exists_many(&physical).await?;

        for key in keys {
            self.unlink_tags(key.as_ref()).await?;
        }

        let deleted = self.backend.del(&physical).await?;
        debug!(requested = keys.len(), deleted, "Cache items removed");

        if deleted > 0 {
            self.emit(|| {
                CacheEvent::new(CacheEventKind::Remove).with_keys(present_keys(keys, &present))
            });
        }
        Ok(deleted)
    }

    /// Delete every key stored under `namespace`, whatever this adapter's own namespace
    pub async fn clear_by_namespace(&self, namespace: &str) -> Result<u64, CacheError> {
        if namespace.is_empty() {
            return Err(CacheError::InvalidArgument("No namespace given".into()));
        }

        let namespacer = KeyNamespacer::new(namespace, &self.config.namespace_separator);
        let pattern = prefix_pattern(namespacer.prefix());
        let deleted = self.sweep(&namespacer, &pattern, "", true).await?;

        debug!(namespace, deleted, "Cleared namespace");
        self.emit(|| CacheEvent::new(CacheEventKind::ClearByNamespace).with_scope(namespace));
        Ok(deleted)
    }

    /// Delete every entry of this adapter's namespace whose key starts with `prefix`
    pub async fn clear_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        if prefix.is_empty() {
            return Err(CacheError::InvalidArgument("No prefix given".into()));
        }

        let pattern = self.namespacer.scan_pattern(prefix);
        let deleted = self.sweep(&self.namespacer, &pattern, prefix, false).await?;

        debug!(prefix, deleted, "Cleared prefix");
        self.emit(|| CacheEvent::new(CacheEventKind::ClearByPrefix).with_scope(prefix));
        Ok(deleted)
    }

    /// KEYS then DEL over one namespace, keeping the tag index consistent.
    ///
    /// Every matched entry whose key starts with `logical_prefix` leaves the
    /// tag index before it is deleted, along with entries that already
    /// expired but still own a matched tag set. Index sets are only dropped
    /// with `whole_namespace`, once no entry of the namespace is left to
    /// reference them. Returns the number of entries deleted.
    async fn sweep(
        &self,
        namespacer: &KeyNamespacer,
        pattern: &str,
        logical_prefix: &str,
        whole_namespace: bool,
    ) -> Result<u64, CacheError> {
        let matched = self.scan(pattern).await?;

        let mut entries = Vec::new();
        let mut index = Vec::new();
        let mut owners = BTreeSet::new();
        for key in &matched {
            match namespacer.classify(key) {
                Some(KeyRole::Entry(logical)) => {
                    owners.insert(logical);
                    entries.push(key.clone());
                }
                Some(KeyRole::TagSet(owner)) => {
                    if owner.starts_with(logical_prefix) {
                        owners.insert(owner);
                    }
                    index.push(key.clone());
                }
                Some(KeyRole::TagMembers(_)) | None => index.push(key.clone()),
            }
        }

        for owner in owners {
            self.unlink_tags_in(namespacer, owner).await?;
        }

        let deleted = self.backend.del(&entries).await?;
        if whole_namespace {
            self.backend.del(&index).await?;
        }
        Ok(deleted)
    }

    /// KEYS with the backend's own prefix stripped from the results
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let client_prefix = self.backend.key_prefix();
        Ok(self
            .backend
            .keys(pattern)
            .await?
            .into_iter()
            .map(|key| match key.strip_prefix(client_prefix) {
                Some(stripped) => stripped.to_string(),
                None => key,
            })
            .collect())
    }

    fn physical_keys<K: AsRef<str>>(&self, keys: &[K]) -> Vec<String> {
        keys.iter()
            .map(|key| self.namespacer.physical_key(key.as_ref()))
            .collect()
    }
}

/// Keys whose flag in `present` is set
fn present_keys<K: AsRef<str>>(keys: &[K], present: &[bool]) -> Vec<String> {
    keys.iter()
        .zip(present)
        .filter(|(_, found)| **found)
        .map(|(key, _)| key.as_ref().to_string())
        .collect()
}
