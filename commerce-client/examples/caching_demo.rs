use chrono::Duration;
use commerce_client::{ApiClient, CacheConfig};
use serde_json::Value;
use surf::Url;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let base_url: Url = std::env::var("ADMIN_API_URL")
        .unwrap_or_else(|_| "http://localhost:8080/api/".to_string())
        .parse()?;

    // Client without caching: every GET hits the backend.
    println!("=== Uncached client ===");
    let basic = ApiClient::new(base_url.clone());
    let start = std::time::Instant::now();
    let products = basic.get::<Value>("products?page=1").await?;
    println!("first fetch took {:?}", start.elapsed());
    println!("got response: {}", products.is_some());

    // Client with caching: repeats inside the TTL window are free.
    println!("\n=== Cached client ===");
    let cache_config = CacheConfig::new(
        Duration::minutes(5), // response TTL
        500,                  // max cached entries
        Duration::minutes(1), // sweep interval
    );
    let cached = ApiClient::with_cache(base_url, cache_config);

    let start = std::time::Instant::now();
    cached.get::<Value>("products?page=1").await?;
    let cold = start.elapsed();
    println!("cold fetch took {:?}", cold);

    let start = std::time::Instant::now();
    cached.get::<Value>("products?page=1").await?;
    let warm = start.elapsed();
    println!("warm fetch took {:?}", warm);

    if let Some(stats) = cached.cache_stats() {
        println!(
            "cache: {} total, {} fresh, {} pending",
            stats.total_entries, stats.fresh_entries, stats.pending_requests
        );
    }

    cached.evict_expired_cache();
    println!("after eviction: {:?}", cached.cache_stats());

    Ok(())
}
