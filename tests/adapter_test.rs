//! Integration tests for single-key adapter operations
//!
//! Runs against the in-memory backend; see `redis_test.rs` for the same
//! contract against a live server.

mod common;

use std::sync::Arc;

use common::{adapter_over, memory_adapter};
use tagcache::prelude::*;

#[tokio::test]
async fn test_get_missing_item_is_absent() {
    let cache = memory_adapter("test", 0);

    assert_eq!(cache.get_item("never-set").await.unwrap(), None);
    assert!(!cache.has_item("never-set").await.unwrap());
}

#[tokio::test]
async fn test_set_then_get_normalizes_values() {
    let cache = memory_adapter("test", 0);

    cache.set_item("string", "value").await.unwrap();
    cache.set_item("int", 123).await.unwrap();
    cache.set_item("float", 123.12).await.unwrap();
    cache.set_item("true", true).await.unwrap();
    cache.set_item("false", false).await.unwrap();
    cache.set_item("null", None::<String>).await.unwrap();
    cache.set_item("unit", ()).await.unwrap();

    assert_eq!(cache.get_item("string").await.unwrap().as_deref(), Some("value"));
    assert_eq!(cache.get_item("int").await.unwrap().as_deref(), Some("123"));
    assert_eq!(cache.get_item("float").await.unwrap().as_deref(), Some("123.12"));
    assert_eq!(cache.get_item("true").await.unwrap().as_deref(), Some("1"));
    assert_eq!(cache.get_item("false").await.unwrap().as_deref(), Some(""));
    assert_eq!(cache.get_item("null").await.unwrap().as_deref(), Some(""));
    assert_eq!(cache.get_item("unit").await.unwrap().as_deref(), Some(""));
}

#[tokio::test]
async fn test_set_overwrites_previous_value() {
    let cache = memory_adapter("test", 0);

    assert!(cache.set_item("key", "first").await.unwrap());
    assert!(cache.set_item("key", "second").await.unwrap());
    assert_eq!(cache.get_item("key").await.unwrap().as_deref(), Some("second"));
}

#[tokio::test]
async fn test_remove_item() {
    let cache = memory_adapter("test", 0);
    cache.set_item("key", "value").await.unwrap();

    assert!(cache.remove_item("key").await.unwrap());
    assert!(!cache.has_item("key").await.unwrap());
    assert!(!cache.remove_item("key").await.unwrap());
}

#[tokio::test]
async fn test_increment_and_decrement() {
    let cache = memory_adapter("test", 0);

    cache.set_item("up", 100).await.unwrap();
    assert_eq!(cache.increment_item("up", 100).await.unwrap(), 200);

    cache.set_item("down", 100).await.unwrap();
    assert_eq!(cache.decrement_item("down", 100).await.unwrap(), 0);

    // Missing counters start from zero
    assert_eq!(cache.increment_item("fresh", 5).await.unwrap(), 5);
    assert_eq!(cache.decrement_item("fresh-down", 5).await.unwrap(), -5);
}

#[tokio::test]
async fn test_increment_non_numeric_value_fails() {
    let cache = memory_adapter("test", 0);
    cache.set_item("text", "abc").await.unwrap();

    assert!(cache.increment_item("text", 1).await.is_err());
    assert_eq!(cache.get_item("text").await.unwrap().as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_touch_reapplies_configured_ttl() {
    let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());

    let without_ttl = adapter_over(backend.clone(), "test", 0);
    without_ttl.set_item("key", "value").await.unwrap();

    let metadata = without_ttl.get_metadata("key").await.unwrap().unwrap();
    assert_eq!(metadata.ttl, None);

    // Same data, adapter rebuilt with a TTL
    let with_ttl = adapter_over(backend, "test", 1000);
    assert!(with_ttl.touch_item("key").await.unwrap());

    let metadata = with_ttl.get_metadata("key").await.unwrap().unwrap();
    assert_eq!(metadata.ttl.unwrap().ceil(), 1000.0);
}

#[tokio::test]
async fn test_touch_missing_key_returns_false() {
    assert!(!memory_adapter("test", 60).touch_item("missing").await.unwrap());
    assert!(!memory_adapter("test", 0).touch_item("missing").await.unwrap());
}

#[tokio::test]
async fn test_touch_without_ttl_does_not_delete() {
    let cache = memory_adapter("test", 0);
    cache.set_item("key", "value").await.unwrap();

    assert!(cache.touch_item("key").await.unwrap());
    assert_eq!(cache.get_item("key").await.unwrap().as_deref(), Some("value"));
    assert_eq!(cache.get_metadata("key").await.unwrap().unwrap().ttl, None);
}

#[tokio::test]
async fn test_metadata_of_missing_key_is_none() {
    let cache = memory_adapter("test", 0);
    assert!(cache.get_metadata("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_items_expire_after_ttl() {
    let cache = memory_adapter("test", 1);
    cache.set_item("short", "lived").await.unwrap();
    assert!(cache.has_item("short").await.unwrap());

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    assert_eq!(cache.get_item("short").await.unwrap(), None);
    assert!(cache.get_metadata("short").await.unwrap().is_none());
}

#[test]
fn test_unrepresentable_ttl_is_rejected() {
    let config = CacheConfig::default().with_default_ttl(u64::MAX);

    assert!(matches!(
        CacheAdapter::with_backend(config, Arc::new(MemoryBackend::new())),
        Err(CacheError::Config(_))
    ));
}

#[tokio::test]
async fn test_flush_removes_every_namespace() {
    let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
    let first = adapter_over(backend.clone(), "first", 0);
    let second = adapter_over(backend, "second", 0);

    first.set_item("a", 1).await.unwrap();
    second.set_item("b", 2).await.unwrap();

    assert!(first.flush().await.unwrap());
    assert!(!first.has_item("a").await.unwrap());
    assert!(!second.has_item("b").await.unwrap());
}

#[tokio::test]
async fn test_total_space_reports_backend_memory() {
    let backend = MemoryBackend::new().with_total_memory(8 * 1024 * 1024 * 1024);
    let cache = adapter_over(Arc::new(backend), "test", 0);

    assert_eq!(cache.get_total_space().await.unwrap(), 8 * 1024 * 1024 * 1024);
}

#[tokio::test]
async fn test_empty_namespace_uses_logical_keys() {
    let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
    let cache = adapter_over(backend.clone(), "", 0);

    cache.set_item("plain", "value").await.unwrap();
    assert_eq!(backend.get("plain").await.unwrap().as_deref(), Some("value"));
}

#[tokio::test]
async fn test_custom_separator() {
    let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
    let config = CacheConfig::default()
        .with_namespace("app")
        .with_namespace_separator("::");
    let cache = CacheAdapter::with_backend(config, backend.clone()).unwrap();

    cache.set_item("key", "value").await.unwrap();
    assert_eq!(backend.get("app::key").await.unwrap().as_deref(), Some("value"));
}

#[tokio::test]
async fn test_ping() {
    assert!(memory_adapter("test", 0).ping().await.unwrap());
}
