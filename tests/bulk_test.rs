//! Integration tests for multi-key operations and namespace clearing

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{adapter_over, memory_adapter, tags};
use tagcache::prelude::*;

#[tokio::test]
async fn test_set_items_then_get_each() {
    let cache = memory_adapter("test", 0);
    let items: Vec<(String, String)> = (1..=5)
        .map(|i| (format!("k{i}"), format!("v{i}")))
        .collect();

    let failed = cache.set_items(items.clone()).await.unwrap();
    assert!(failed.is_empty());

    for (key, value) in &items {
        assert_eq!(cache.get_item(key).await.unwrap().as_ref(), Some(value));
    }
}

#[tokio::test]
async fn test_set_items_applies_ttl() {
    let cache = memory_adapter("test", 30);

    let failed = cache.set_items([("a", "1"), ("b", "2")]).await.unwrap();
    assert!(failed.is_empty());

    for key in ["a", "b"] {
        let ttl = cache.get_metadata(key).await.unwrap().unwrap().ttl.unwrap();
        assert!(ttl > 29.0 && ttl <= 30.0);
    }
}

#[tokio::test]
async fn test_set_items_without_ttl_never_expires() {
    let cache = memory_adapter("test", 0);
    cache.set_items([("a", 1)]).await.unwrap();

    assert_eq!(cache.get_metadata("a").await.unwrap().unwrap().ttl, None);
}

#[tokio::test]
async fn test_set_items_empty_input() {
    let cache = memory_adapter("test", 0);
    let failed = cache.set_items(Vec::<(String, String)>::new()).await.unwrap();
    assert!(failed.is_empty());
}

#[tokio::test]
async fn test_get_items_skips_missing_keys() {
    let cache = memory_adapter("test", 0);
    cache.set_items([("a", "1"), ("c", "3")]).await.unwrap();

    let found = cache.get_items(&["a", "b", "c"]).await.unwrap();
    let expected = HashMap::from([
        ("a".to_string(), "1".to_string()),
        ("c".to_string(), "3".to_string()),
    ]);
    assert_eq!(found, expected);

    assert!(cache.get_items::<&str>(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_items_single_key() {
    let cache = memory_adapter("test", 0);
    cache.set_item("only", "value").await.unwrap();

    let found = cache.get_items(&["only"]).await.unwrap();
    assert_eq!(found.get("only").map(String::as_str), Some("value"));
}

#[tokio::test]
async fn test_has_items() {
    let cache = memory_adapter("test", 0);
    cache.set_items([("a", "1"), ("c", "3")]).await.unwrap();

    assert_eq!(cache.has_items(&["a", "b", "c"]).await.unwrap(), vec!["a", "c"]);
}

#[tokio::test]
async fn test_remove_items_counts_deleted() {
    let cache = memory_adapter("test", 0);
    cache.set_items([("a", "1"), ("b", "2")]).await.unwrap();

    assert_eq!(cache.remove_items(&["a", "b", "missing"]).await.unwrap(), 2);
    assert!(!cache.has_item("a").await.unwrap());
    assert_eq!(cache.remove_items::<&str>(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_clear_by_prefix() {
    let cache = memory_adapter("test", 0);
    cache.set_item("pre_foo", "1").await.unwrap();
    cache.set_item("pre_bar", "2").await.unwrap();
    cache.set_item("bar", "3").await.unwrap();

    assert_eq!(cache.clear_by_prefix("pre_").await.unwrap(), 2);

    assert!(!cache.has_item("pre_foo").await.unwrap());
    assert!(!cache.has_item("pre_bar").await.unwrap());
    assert!(cache.has_item("bar").await.unwrap());
}

#[tokio::test]
async fn test_clear_by_prefix_stays_in_namespace() {
    let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
    let mine = adapter_over(backend.clone(), "mine", 0);
    let theirs = adapter_over(backend, "theirs", 0);

    mine.set_item("pre_foo", "1").await.unwrap();
    theirs.set_item("pre_foo", "2").await.unwrap();

    assert_eq!(mine.clear_by_prefix("pre_").await.unwrap(), 1);
    assert!(theirs.has_item("pre_foo").await.unwrap());
}

#[tokio::test]
async fn test_clear_by_prefix_treats_glob_characters_literally() {
    let cache = memory_adapter("test", 0);
    cache.set_item("a*b", "1").await.unwrap();
    cache.set_item("axb", "2").await.unwrap();

    assert_eq!(cache.clear_by_prefix("a*").await.unwrap(), 1);
    assert!(cache.has_item("axb").await.unwrap());
}

#[tokio::test]
async fn test_clear_by_namespace() {
    let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
    let sessions = adapter_over(backend.clone(), "sessions", 0);
    let pages = adapter_over(backend, "pages", 0);

    sessions.set_items([("a", "1"), ("b", "2")]).await.unwrap();
    pages.set_item("home", "html").await.unwrap();

    // Any adapter may clear another namespace
    assert_eq!(pages.clear_by_namespace("sessions").await.unwrap(), 2);
    assert!(!sessions.has_item("a").await.unwrap());
    assert!(pages.has_item("home").await.unwrap());

    // Nothing left to match is still a success
    assert_eq!(pages.clear_by_namespace("sessions").await.unwrap(), 0);
}

#[tokio::test]
async fn test_clear_by_namespace_does_not_match_longer_names() {
    let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
    let short = adapter_over(backend.clone(), "app", 0);
    let long = adapter_over(backend, "application", 0);

    short.set_item("a", "1").await.unwrap();
    long.set_item("a", "2").await.unwrap();

    assert_eq!(short.clear_by_namespace("app").await.unwrap(), 1);
    assert!(long.has_item("a").await.unwrap());
}

#[tokio::test]
async fn test_clear_operations_strip_backend_key_prefix() {
    let backend: Arc<dyn KeyValueBackend> =
        Arc::new(MemoryBackend::new().with_key_prefix("client:"));
    let cache = adapter_over(backend.clone(), "test", 0);

    cache.set_items([("pre_a", "1"), ("pre_b", "2"), ("c", "3")]).await.unwrap();

    assert_eq!(cache.clear_by_prefix("pre_").await.unwrap(), 2);
    assert_eq!(cache.clear_by_namespace("test").await.unwrap(), 1);
    assert!(backend.keys("*").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_with_empty_argument_is_rejected() {
    let cache = memory_adapter("test", 0);

    assert!(matches!(
        cache.clear_by_namespace("").await,
        Err(CacheError::InvalidArgument(_))
    ));
    assert!(matches!(
        cache.clear_by_prefix("").await,
        Err(CacheError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_clear_by_prefix_unlinks_tags() {
    let cache = memory_adapter("test", 0);
    cache.set_item("pre_foo", "1").await.unwrap();
    cache.set_tags("pre_foo", ["t"]).await.unwrap();

    assert_eq!(cache.clear_by_prefix("pre_").await.unwrap(), 1);
    assert!(cache.get_keys_by_tag("t").await.unwrap().is_empty());

    // A new entry under the same key must not inherit the old membership
    cache.set_item("pre_foo", "2").await.unwrap();
    assert_eq!(cache.get_tags("pre_foo").await.unwrap(), None);
    assert_eq!(cache.clear_by_tags(["t"], true).await.unwrap(), 0);
    assert!(cache.has_item("pre_foo").await.unwrap());
}

#[tokio::test]
async fn test_clear_by_prefix_leaves_tag_index_alone() {
    let cache = memory_adapter("test", 0);
    cache.set_items([("k", "1"), ("task", "2")]).await.unwrap();
    cache.set_tags("k", ["x"]).await.unwrap();
    cache.set_tags("task", ["x"]).await.unwrap();

    // "ta" also matches the `tags:x` membership set
    assert_eq!(cache.clear_by_prefix("ta").await.unwrap(), 1);
    assert!(!cache.has_item("task").await.unwrap());

    assert_eq!(cache.get_tags("k").await.unwrap(), Some(tags(&["x"])));
    assert_eq!(cache.get_keys_by_tag("x").await.unwrap(), tags(&["k"]));
    assert_eq!(cache.clear_by_tags(["x"], true).await.unwrap(), 1);
    assert!(!cache.has_item("k").await.unwrap());
}

#[tokio::test]
async fn test_clear_by_prefix_does_not_unlink_unmatched_owner() {
    let cache = memory_adapter("test", 0);
    cache.set_item("pre_x", "1").await.unwrap();
    cache.set_tags("pre_x", ["t"]).await.unwrap();

    // Matches the `pre_x:tags` set but not the entry `pre_x`
    assert_eq!(cache.clear_by_prefix("pre_x:t").await.unwrap(), 0);
    assert!(cache.has_item("pre_x").await.unwrap());
    assert_eq!(cache.get_tags("pre_x").await.unwrap(), Some(tags(&["t"])));
    assert_eq!(cache.get_keys_by_tag("t").await.unwrap(), tags(&["pre_x"]));
}

#[tokio::test]
async fn test_clear_by_prefix_cleans_tags_of_expired_entries() {
    let cache = memory_adapter("test", 1);
    cache.set_item("pre_short", "1").await.unwrap();
    cache.set_tags("pre_short", ["t"]).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    assert_eq!(cache.clear_by_prefix("pre_").await.unwrap(), 0);
    assert_eq!(cache.get_tags("pre_short").await.unwrap(), None);
    assert!(cache.get_keys_by_tag("t").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_by_namespace_drops_its_tag_index() {
    let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
    let sessions = adapter_over(backend.clone(), "sessions", 0);
    let pages = adapter_over(backend.clone(), "pages", 0);

    sessions.set_items([("a", "1"), ("b", "2")]).await.unwrap();
    sessions.set_tags("a", ["user:1"]).await.unwrap();
    sessions.set_tags("b", ["user:1", "admin"]).await.unwrap();
    pages.set_item("home", "html").await.unwrap();
    pages.set_tags("home", ["user:1"]).await.unwrap();

    assert_eq!(pages.clear_by_namespace("sessions").await.unwrap(), 2);

    assert!(backend.keys("sessions:*").await.unwrap().is_empty());
    assert!(sessions.get_keys_by_tag("user:1").await.unwrap().is_empty());
    assert_eq!(pages.get_keys_by_tag("user:1").await.unwrap(), tags(&["home"]));
}

#[tokio::test]
async fn test_has_items_empty_input() {
    let cache = memory_adapter("test", 0);
    assert!(cache.has_items::<&str>(&[]).await.unwrap().is_empty());
}
