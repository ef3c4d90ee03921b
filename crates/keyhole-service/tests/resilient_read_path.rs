//! End-to-end scenarios over the full in-memory stack: service →
//! cached repository → (cache through breaker, singleflight) → store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use keyhole_cache::InMemoryCacheStore;
use keyhole_core::{
    CacheError, CacheStore, CreateUrlRequest, ServiceError, StorageError, UrlRecord, UrlShortening,
    UrlStore, NOT_FOUND_SENTINEL,
};
use keyhole_resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use keyhole_service::{CachedRepository, CachedRepositoryConfig, UrlService, UrlServiceConfig};
use keyhole_storage::InMemoryUrlStore;
use uuid::Uuid;

/// Counts primary reads and delays them so concurrent readers overlap.
struct CountingStore {
    inner: InMemoryUrlStore,
    delay: Duration,
    gets: AtomicUsize,
}

impl CountingStore {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryUrlStore::new(),
            delay,
            gets: AtomicUsize::new(0),
        })
    }

    fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlStore for CountingStore {
    async fn get_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.get_by_code(code).await
    }

    async fn insert(&self, record: UrlRecord) -> Result<UrlRecord, StorageError> {
        self.inner.insert(record).await
    }

    async fn delete(&self, code: &str) -> Result<bool, StorageError> {
        self.inner.delete(code).await
    }
}

/// A cache whose operations fail while `healthy` is false.
struct SwitchableCache {
    inner: InMemoryCacheStore,
    healthy: std::sync::atomic::AtomicBool,
}

impl SwitchableCache {
    fn new(healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCacheStore::new(),
            healthy: std::sync::atomic::AtomicBool::new(healthy),
        })
    }

    fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable("cache process stopped".to_string()))
        }
    }
}

#[async_trait]
impl CacheStore for SwitchableCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.check()?;
        self.inner.del(key).await
    }
}

fn breaker(consecutive_failures: u32, timeout: Duration, max_requests: u32) -> Arc<CircuitBreaker> {
    Arc::new(CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .name("cache")
            .consecutive_failures(consecutive_failures)
            .timeout(timeout)
            .max_requests(max_requests)
            .build(),
    ))
}

fn stack(
    store: Arc<dyn UrlStore>,
    cache: Option<Arc<dyn CacheStore>>,
    breaker: Arc<CircuitBreaker>,
) -> UrlService {
    let repository = CachedRepository::new(
        store,
        cache,
        breaker,
        CachedRepositoryConfig::builder().build(),
    );
    UrlService::new(
        Arc::new(repository),
        UrlServiceConfig::builder()
            .base_url("https://key.hole")
            .build(),
    )
}

#[tokio::test]
async fn missing_code_is_negatively_cached() {
    let store = CountingStore::new(Duration::ZERO);
    let cache = Arc::new(InMemoryCacheStore::new());
    let service = stack(
        store.clone(),
        Some(cache.clone()),
        breaker(5, Duration::from_secs(30), 1),
    );

    let err = service.get_url("nonexistent123").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // The stable cache key now holds the stable sentinel literal.
    assert_eq!(
        cache.get("url:nonexistent123").await.unwrap(),
        Some(NOT_FOUND_SENTINEL.to_vec())
    );

    // Repeated lookups are answered by the sentinel, not the primary.
    let _ = service.get_url("nonexistent123").await.unwrap_err();
    assert_eq!(store.gets(), 1);
}

#[tokio::test]
async fn writes_remain_visible_while_the_cache_is_down() {
    let store = CountingStore::new(Duration::ZERO);
    let cache = SwitchableCache::new(false);
    let service = stack(
        store.clone(),
        Some(cache.clone()),
        breaker(2, Duration::from_secs(30), 1),
    );

    // The cache process is "stopped"; creating and reading must still work.
    let created = service
        .create_short_url(CreateUrlRequest {
            url: "https://x".to_string(),
            custom_alias: Some("abc".to_string()),
            expires_in_days: None,
        })
        .await
        .unwrap();
    assert_eq!(created.short_code, "abc");

    let fetched = service.get_url("abc").await.unwrap();
    assert_eq!(fetched.original_url, "https://x");

    // Cache faults were contained: reads were served from the primary.
    assert!(store.gets() >= 1);
}

#[tokio::test]
async fn concurrent_cold_readers_coalesce_to_one_primary_read() {
    let store = CountingStore::new(Duration::from_millis(50));
    let cache = Arc::new(InMemoryCacheStore::new());
    let service = Arc::new(stack(
        store.clone(),
        Some(cache.clone()),
        breaker(5, Duration::from_secs(30), 1),
    ));

    store
        .inner
        .insert(UrlRecord {
            id: Uuid::new_v4(),
            short_code: "k".to_string(),
            original_url: "https://example.com".to_string(),
            created_at: Timestamp::now(),
            expires_at: None,
            click_count: 0,
        })
        .await
        .unwrap();

    let mut readers = Vec::new();
    for _ in 0..10 {
        let service = Arc::clone(&service);
        readers.push(tokio::spawn(
            async move { service.redirect("k").await },
        ));
    }

    for reader in readers {
        assert_eq!(reader.await.unwrap().unwrap(), "https://example.com");
    }
    assert_eq!(store.gets(), 1);
}

#[tokio::test]
async fn breaker_opens_on_cache_faults_and_recovers_after_cooldown() {
    let store = CountingStore::new(Duration::ZERO);
    let cache = SwitchableCache::new(false);
    let breaker = breaker(2, Duration::from_millis(100), 3);
    let service = stack(store.clone(), Some(cache.clone()), Arc::clone(&breaker));

    store
        .inner
        .insert(UrlRecord {
            id: Uuid::new_v4(),
            short_code: "k".to_string(),
            original_url: "https://example.com".to_string(),
            created_at: Timestamp::now(),
            expires_at: None,
            click_count: 0,
        })
        .await
        .unwrap();

    // The failing cache lookups inside one read trip the breaker; the
    // read itself still succeeds against the primary.
    assert!(service.get_url("k").await.is_ok());
    assert_eq!(breaker.state(), CircuitState::Open);

    // The cache comes back; after the cooldown a read probes it, falls
    // through to the primary, and repopulates the entry.
    cache.set_healthy(true);
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(service.get_url("k").await.is_ok());
    let primary_reads = store.gets();

    // Subsequent reads are cache hits.
    assert!(service.get_url("k").await.is_ok());
    assert_eq!(store.gets(), primary_reads);
}

#[tokio::test]
async fn create_delete_get_over_the_cached_stack() {
    let store = CountingStore::new(Duration::ZERO);
    let cache = Arc::new(InMemoryCacheStore::new());
    let service = stack(
        store.clone(),
        Some(cache.clone()),
        breaker(5, Duration::from_secs(30), 1),
    );

    let created = service
        .create_short_url(CreateUrlRequest {
            url: "https://example.com/doc".to_string(),
            custom_alias: None,
            expires_in_days: None,
        })
        .await
        .unwrap();

    // The write-through entry serves the first read.
    assert_eq!(
        service.redirect(&created.short_code).await.unwrap(),
        "https://example.com/doc"
    );
    assert_eq!(store.gets(), 0);

    service.delete_url(&created.short_code).await.unwrap();
    let err = service.get_url(&created.short_code).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
