//! # Tagging Example
//!
//! This example walks through the tag index against the in-memory backend:
//! - Storing entries and attaching tags
//! - Listening to cache events
//! - Invalidating by any tag and by all tags
//! - Bulk operations and prefix clearing

use std::sync::Arc;

use tagcache::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 TagCache Tagging Example");
    println!("===========================");

    let config = AppConfig {
        cache: CacheConfig::default().with_namespace("shop"),
        ..AppConfig::default()
    };
    let tagcache = TagCache::with_backend(config, Arc::new(MemoryBackend::new()))?;

    if let Some(signals) = tagcache.signals() {
        signals.add_callback(|event| {
            println!("   📡 {:?} keys={:?} tags={:?}", event.kind, event.keys, event.tags);
        });
    }

    let cache = tagcache.cache();

    // 1. Store and tag
    println!("\n🏷️  Storing tagged products");
    println!("--------------------------");
    cache.set_item("lamp", "{\"price\":40}").await?;
    cache.set_item("desk", "{\"price\":250}").await?;
    cache.set_item("chair", "{\"price\":90}").await?;

    cache.set_tags("lamp", ["lighting", "sale"]).await?;
    cache.set_tags("desk", ["furniture", "sale"]).await?;
    cache.set_tags("chair", ["furniture"]).await?;

    for key in ["lamp", "desk", "chair"] {
        println!("   {key}: {:?}", cache.get_tags(key).await?);
    }

    // 2. Tagging a missing entry does nothing
    let tagged = cache.set_tags("sofa", ["furniture"]).await?;
    println!("\n❔ Tagging a missing entry applied: {tagged}");

    // 3. Conjunction only removes entries carrying every tag
    println!("\n🧹 Clearing furniture AND sale");
    let removed = cache.clear_by_tags(["furniture", "sale"], false).await?;
    println!("   removed {removed}, chair still cached: {}", cache.has_item("chair").await?);

    // 4. Disjunction removes entries carrying any tag
    println!("\n🧹 Clearing lighting OR furniture");
    let removed = cache.clear_by_tags(["lighting", "furniture"], true).await?;
    println!("   removed {removed}");

    // 5. Bulk operations
    println!("\n📦 Bulk operations");
    println!("------------------");
    let failed = cache
        .set_items([("user:1", "alice"), ("user:2", "bob"), ("order:1", "pending")])
        .await?;
    println!("   failed writes: {failed:?}");

    let users = cache.get_items(&["user:1", "user:2", "user:3"]).await?;
    println!("   fetched: {users:?}");

    let cleared = cache.clear_by_prefix("user:").await?;
    println!("   cleared {cleared} user entries, order kept: {}", cache.has_item("order:1").await?);

    // 6. Counters and metadata
    println!("\n🔢 Counters");
    println!("-----------");
    cache.increment_item("visits", 5).await?;
    let visits = cache.decrement_item("visits", 2).await?;
    println!("   visits = {visits}");
    println!("   metadata = {:?}", cache.get_metadata("visits").await?);

    // 7. A second namespace on the same backend
    let sessions = tagcache.namespaced("sessions", Some(1800))?;
    sessions.set_item("abc", "token").await?;
    let cleared = cache.clear_by_namespace("sessions").await?;
    println!("\n🗂️  Cleared {cleared} entries from the sessions namespace");

    println!("\n✅ Done");
    Ok(())
}
