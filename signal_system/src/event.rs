//! Cache event types and definitions
//!
//! This module defines the structure of cache mutation events
//! that flow through the signal system.

use serde::{Deserialize, Serialize};

/// Kind of cache mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheEventKind {
    Set,
    Remove,
    Touch,
    TagsChanged,
    ClearByTags,
    ClearByNamespace,
    ClearByPrefix,
    Flush,
}

/// Cache event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEvent {
    pub kind: CacheEventKind,
    /// Logical keys affected by the mutation
    pub keys: Vec<String>,
    /// Tags involved (new tags for `TagsChanged`, requested tags for `ClearByTags`)
    pub tags: Vec<String>,
    /// Namespace or prefix for the clear operations
    pub scope: Option<String>,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl CacheEvent {
    pub fn new(kind: CacheEventKind) -> Self {
        Self {
            kind,
            keys: Vec::new(),
            tags: Vec::new(),
            scope: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Serialize the event for forwarding to external sinks
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
