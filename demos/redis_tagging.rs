//! # Redis Tagging Example
//!
//! Runs the tag workflow against a live Redis server. Configuration comes
//! from `tagcache.toml` or the file named by `TAGCACHE_CONFIG`.
//!
//! ```text
//! docker run -d --name redis -p 6379:6379 redis:7-alpine
//! ```

use tagcache::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 TagCache Redis Example");
    println!("=========================");

    let config = AppConfig::load().unwrap_or_else(|err| {
        println!("⚠️  {err}, using defaults");
        AppConfig {
            cache: CacheConfig::default()
                .with_namespace("tagcache-demo")
                .with_default_ttl(300),
            ..AppConfig::default()
        }
    });

    let tagcache = TagCache::new(config)?;
    if let Err(e) = tagcache.health_check().await {
        println!("❌ Redis connection failed: {e}");
        println!("💡 Please start Redis: docker run -d --name redis -p 6379:6379 redis:7-alpine");
        return Ok(());
    }
    println!("✅ Redis connection healthy");

    let cache = tagcache.cache();
    cache.set_item("article:1", "Rust caching").await?;
    cache.set_item("article:2", "Redis tags").await?;
    cache.set_tags("article:1", ["articles", "rust"]).await?;
    cache.set_tags("article:2", ["articles", "redis"]).await?;

    println!("\n🏷️  Keys tagged 'articles': {:?}", cache.get_keys_by_tag("articles").await?);
    println!("⏱️  article:1 metadata: {:?}", cache.get_metadata("article:1").await?);

    let removed = cache.clear_by_tags(["articles", "rust"], false).await?;
    println!("🧹 Removed {removed} entry tagged articles AND rust");

    let removed = cache.clear_by_namespace("tagcache-demo").await?;
    println!("🧹 Cleared {removed} remaining keys of the demo namespace");

    println!("💾 Host memory: {} bytes", cache.get_total_space().await?);
    Ok(())
}
