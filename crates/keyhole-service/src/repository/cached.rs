use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keyhole_core::{
    cache_key, CacheStore, StorageError, UrlRecord, UrlStore, NOT_FOUND_SENTINEL,
};
use keyhole_resilience::{BreakerError, CircuitBreaker, FlightError, Singleflight};
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// TTL configuration for a [`CachedRepository`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct CachedRepositoryConfig {
    /// TTL for cached records.
    #[builder(default = Duration::from_secs(3600))]
    pub positive_ttl: Duration,
    /// TTL for the not-found sentinel.
    #[builder(default = Duration::from_secs(60))]
    pub negative_ttl: Duration,
}

/// Outcome of a breaker-guarded cache lookup.
enum CacheLookup {
    /// A serialized record was found and decoded.
    Hit(UrlRecord),
    /// The not-found sentinel was found: the code is known absent.
    Negative,
    /// Key absent, breaker open, transport error, or undecodable entry.
    /// Only the primary store can resolve this.
    Miss,
}

/// A [`UrlStore`] decorator that adds a resilient cache in front of the
/// primary store.
///
/// Reads are cache-aside with negative caching: a miss falls through to
/// the primary under a per-key singleflight, and the result — including
/// "not found" — is written back. Writes go through to the primary
/// first and then refresh or invalidate the cache. Every cache
/// operation runs through the circuit breaker, and no cache failure of
/// any kind ever reaches the caller: the cache can only ever make reads
/// faster, never make them fail.
///
/// The primary store remains the sole source of truth. A concurrent
/// reader may briefly observe a stale positive entry after a delete (or
/// a miss after a create) until the corresponding cache write lands;
/// both windows are bounded by the cache-write latency plus the TTL.
#[derive(Clone)]
pub struct CachedRepository {
    inner: Arc<dyn UrlStore>,
    cache: Option<Arc<dyn CacheStore>>,
    breaker: Arc<CircuitBreaker>,
    flights: Singleflight<String, Result<Option<UrlRecord>, StorageError>>,
    config: CachedRepositoryConfig,
}

impl CachedRepository {
    /// Creates a new cached repository decorator.
    ///
    /// Passing `None` for the cache yields a pass-through repository:
    /// reads still coalesce through the singleflight, but nothing is
    /// cached.
    pub fn new(
        inner: Arc<dyn UrlStore>,
        cache: Option<Arc<dyn CacheStore>>,
        breaker: Arc<CircuitBreaker>,
        config: CachedRepositoryConfig,
    ) -> Self {
        Self {
            inner,
            cache,
            breaker,
            flights: Singleflight::new(),
            config,
        }
    }

    /// Looks the key up in the cache through the breaker.
    ///
    /// Anything that is not a decodable value or the sentinel collapses
    /// to a miss: the cache never blocks a read.
    async fn cache_lookup(&self, key: &str) -> CacheLookup {
        let Some(cache) = &self.cache else {
            return CacheLookup::Miss;
        };

        match self.breaker.call(cache.get(key)).await {
            Ok(Some(bytes)) if bytes == NOT_FOUND_SENTINEL => {
                debug!(key, "negative cache hit");
                CacheLookup::Negative
            }
            Ok(Some(bytes)) => match serde_json::from_slice::<UrlRecord>(&bytes) {
                Ok(record) => {
                    debug!(key, "cache hit");
                    CacheLookup::Hit(record)
                }
                Err(e) => {
                    warn!(key, error = %e, "undecodable cache entry, treating as a miss");
                    CacheLookup::Miss
                }
            },
            Ok(None) => {
                trace!(key, "cache miss");
                CacheLookup::Miss
            }
            Err(BreakerError::Open) => {
                debug!(key, "cache breaker open, reading from primary");
                CacheLookup::Miss
            }
            Err(BreakerError::Inner(e)) => {
                warn!(key, error = %e, "cache read failed, reading from primary");
                CacheLookup::Miss
            }
        }
    }

    /// Writes a serialized record to the cache; failures are logged and
    /// swallowed because the primary already holds the truth.
    async fn cache_put(&self, key: &str, record: &UrlRecord) {
        let Some(cache) = &self.cache else {
            return;
        };

        let bytes = match serde_json::to_vec(record) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize record for caching");
                return;
            }
        };

        match self
            .breaker
            .call(cache.set(key, &bytes, self.config.positive_ttl))
            .await
        {
            Ok(()) => trace!(key, "cached record"),
            Err(BreakerError::Open) => debug!(key, "cache breaker open, skipping cache write"),
            Err(BreakerError::Inner(e)) => warn!(key, error = %e, "cache write failed"),
        }
    }

    /// Writes the not-found sentinel with the short negative TTL.
    async fn cache_put_negative(&self, key: &str) {
        let Some(cache) = &self.cache else {
            return;
        };

        match self
            .breaker
            .call(cache.set(key, NOT_FOUND_SENTINEL, self.config.negative_ttl))
            .await
        {
            Ok(()) => trace!(key, "cached not-found sentinel"),
            Err(BreakerError::Open) => debug!(key, "cache breaker open, skipping negative entry"),
            Err(BreakerError::Inner(e)) => warn!(key, error = %e, "negative cache write failed"),
        }
    }

    /// Removes a cache entry; failures are logged and swallowed — a
    /// stale positive entry corrects itself once its TTL lapses.
    async fn cache_invalidate(&self, key: &str) {
        let Some(cache) = &self.cache else {
            return;
        };

        match self.breaker.call(cache.del(key)).await {
            Ok(()) => trace!(key, "invalidated cache entry"),
            Err(BreakerError::Open) => debug!(key, "cache breaker open, skipping invalidation"),
            Err(BreakerError::Inner(e)) => warn!(key, error = %e, "cache delete failed"),
        }
    }

    /// The singleflight loader: one execution per key per flight, on a
    /// task detached from any individual caller.
    async fn load_through(self, code: String, key: String) -> Result<Option<UrlRecord>, StorageError> {
        // Double-checked lookup: a flight that completed between our
        // cache miss and this load may have just populated the entry.
        match self.cache_lookup(&key).await {
            CacheLookup::Hit(record) => return Ok(Some(record)),
            CacheLookup::Negative => return Ok(None),
            CacheLookup::Miss => {}
        }

        match self.inner.get_by_code(&code).await {
            Ok(Some(record)) => {
                self.cache_put(&key, &record).await;
                Ok(Some(record))
            }
            Ok(None) => {
                self.cache_put_negative(&key).await;
                Ok(None)
            }
            // Primary errors surface verbatim and never populate the cache.
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl UrlStore for CachedRepository {
    async fn get_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StorageError> {
        let key = cache_key(code);

        match self.cache_lookup(&key).await {
            CacheLookup::Hit(record) => return Ok(Some(record)),
            CacheLookup::Negative => return Ok(None),
            CacheLookup::Miss => {}
        }

        let loader = {
            let this = self.clone();
            let code = code.to_string();
            let key = key.clone();
            move || this.load_through(code, key)
        };
        match self.flights.load(key, loader).await {
            Ok(result) => result,
            Err(FlightError::Aborted) => Err(StorageError::Operation(
                "in-flight primary load aborted".to_string(),
            )),
        }
    }

    async fn insert(&self, record: UrlRecord) -> Result<UrlRecord, StorageError> {
        // Primary first; conflicts and transport errors surface
        // unchanged and the cache is not touched.
        let stored = self.inner.insert(record).await?;
        self.cache_put(&cache_key(&stored.short_code), &stored).await;
        Ok(stored)
    }

    async fn delete(&self, code: &str) -> Result<bool, StorageError> {
        let removed = self.inner.delete(code).await?;
        if removed {
            self.cache_invalidate(&cache_key(code)).await;
        }
        Ok(removed)
    }
}
