//! Tag index
//!
//! Each tagged entry `K` owns a set `<K>:tags` listing its tags, and each tag
//! `T` owns a set `tags:<T>` listing the logical keys carrying it. Both live
//! in the adapter's namespace. `K` is in `tags:<T>` exactly when `T` is in
//! `<K>:tags`, and `<K>:tags` only exists while `K` has at least one tag.
//!
//! Replacement goes through [`KeyValueBackend::replace_tags`], which is a
//! single script on Redis. Backends relying on the default implementation
//! apply the steps one command at a time and can briefly expose one side of
//! the index without the other.
//!
//! [`KeyValueBackend::replace_tags`]: crate::backend::KeyValueBackend::replace_tags

use std::collections::{BTreeSet, HashMap};

use signal_system::{CacheEvent, CacheEventKind};
use tracing::debug;

use crate::adapter::CacheAdapter;
use crate::backend::TagReplacement;
use crate::errors::CacheError;
use crate::namespace::KeyNamespacer;

impl CacheAdapter {
    /// Replace the tags of an existing entry. An empty list removes all tags.
    ///
    /// Returns false, without touching the index, when the entry does not exist.
    pub async fn set_tags<I, S>(&self, key: &str, tags: I) -> Result<bool, CacheError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags = dedup(tags);
        let applied = self.replace_tags(key, &tags, true).await?;

        if applied {
            debug!(key, tag_count = tags.len(), "Tags replaced");
            self.emit(|| {
                CacheEvent::new(CacheEventKind::TagsChanged)
                    .with_key(key)
                    .with_tags(tags.iter().cloned())
            });
        }
        Ok(applied)
    }

    /// Tags of `key`, `None` when it has none
    pub async fn get_tags(&self, key: &str) -> Result<Option<BTreeSet<String>>, CacheError> {
        let tags = self
            .backend
            .smembers(&self.namespacer.tag_set_key(key))
            .await?;
        Ok((!tags.is_empty()).then_some(tags))
    }

    /// Logical keys currently carrying `tag`
    pub async fn get_keys_by_tag(&self, tag: &str) -> Result<BTreeSet<String>, CacheError> {
        self.backend
            .smembers(&self.namespacer.tag_members_key(tag))
            .await
    }

    /// Remove entries by tag and return how many were deleted.
    ///
    /// With `disjunction` an entry goes when it carries any of `tags`,
    /// otherwise only when it carries all of them.
    pub async fn clear_by_tags<I, S>(&self, tags: I, disjunction: bool) -> Result<u64, CacheError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requested: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        if requested.is_empty() {
            return Ok(0);
        }

        let mut matched: HashMap<String, BTreeSet<&str>> = HashMap::new();
        for tag in &requested {
            for key in self.get_keys_by_tag(tag).await? {
                matched.entry(key).or_default().insert(tag.as_str());
            }
        }

        if matched.is_empty() {
            return Ok(0);
        }

        let mut doomed: Vec<String> = matched
            .into_iter()
            .filter(|(_, key_tags)| disjunction || key_tags.len() == requested.len())
            .map(|(key, _)| key)
            .collect();
        doomed.sort();

        let removed = self.remove_items(&doomed).await?;
        debug!(
            tags = ?requested,
            disjunction,
            removed,
            "Cleared entries by tags"
        );

        self.emit(|| {
            CacheEvent::new(CacheEventKind::ClearByTags)
                .with_keys(doomed.iter().cloned())
                .with_tags(requested.iter().cloned())
        });
        Ok(removed)
    }

    /// Drop every tag of `key` from both index sides before the entry goes away.
    ///
    /// Also runs when the entry itself already expired, so its leftover
    /// tag sets are cleaned up too.
    pub(crate) async fn unlink_tags(&self, key: &str) -> Result<(), CacheError> {
        self.unlink_tags_in(&self.namespacer, key).await
    }

    /// [`unlink_tags`](Self::unlink_tags) for an entry of any namespace
    pub(crate) async fn unlink_tags_in(
        &self,
        namespacer: &KeyNamespacer,
        key: &str,
    ) -> Result<(), CacheError> {
        let current = self.backend.smembers(&namespacer.tag_set_key(key)).await?;
        if !current.is_empty() {
            self.replace_tags_in(namespacer, key, &[], false).await?;
        }
        Ok(())
    }

    async fn replace_tags(
        &self,
        key: &str,
        tags: &[String],
        require_existing: bool,
    ) -> Result<bool, CacheError> {
        self.replace_tags_in(&self.namespacer, key, tags, require_existing)
            .await
    }

    async fn replace_tags_in(
        &self,
        namespacer: &KeyNamespacer,
        key: &str,
        tags: &[String],
        require_existing: bool,
    ) -> Result<bool, CacheError> {
        let item_key = namespacer.physical_key(key);
        let tag_set_key = namespacer.tag_set_key(key);
        let tag_members_prefix = namespacer.tag_members_prefix();

        self.backend
            .replace_tags(TagReplacement {
                item_key: &item_key,
                tag_set_key: &tag_set_key,
                tag_members_prefix: &tag_members_prefix,
                member: key,
                tags,
                require_existing,
            })
            .await
    }
}

/// Keep the first occurrence of each tag, in order
fn dedup<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = BTreeSet::new();
    tags.into_iter()
        .map(Into::into)
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
