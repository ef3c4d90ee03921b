use std::sync::Arc;

use keyhole_cache::RedisCacheStore;
use keyhole_core::CacheStore;
use keyhole_gateway::{App, AppState, GatewayConfig};
use keyhole_resilience::{CircuitBreaker, CircuitBreakerConfig};
use keyhole_service::{CachedRepository, CachedRepositoryConfig, UrlService, UrlServiceConfig};
use keyhole_storage::PostgresUrlStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect(&config.database_url)
        .await?;
    let store = PostgresUrlStore::new(pool);

    let cache: Option<Arc<dyn CacheStore>> = match &config.redis_url {
        Some(redis_url) => Some(Arc::new(RedisCacheStore::connect(redis_url).await?)),
        None => {
            warn!("REDIS_URL not set, running without a cache");
            None
        }
    };

    let breaker = Arc::new(CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .name("redis-cache")
            .max_requests(config.breaker.max_requests)
            .interval(config.breaker.interval)
            .timeout(config.breaker.timeout)
            .consecutive_failures(config.breaker.consecutive_failures)
            .build(),
    ));

    let repository = CachedRepository::new(
        Arc::new(store),
        cache,
        breaker,
        CachedRepositoryConfig::builder()
            .positive_ttl(config.cache_ttl)
            .negative_ttl(config.negative_cache_ttl)
            .build(),
    );

    let service = UrlService::new(
        Arc::new(repository),
        UrlServiceConfig::builder()
            .base_url(config.base_url.clone())
            .short_code_length(config.short_code_length)
            .short_code_retries(config.short_code_retries)
            .build(),
    );

    let state = AppState::new(service);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "starting keyhole gateway");
    axum::serve(listener, App::router(state)).await?;

    Ok(())
}
